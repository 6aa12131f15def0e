// ABOUTME: Version constant, REPL banner, and release-check endpoints

pub const VERSION: &str = "0.12.0";

pub const WELCOME_BANNER: &str = r#"+===+ +===+ =====
|   | |   |   |
+===+ +===+   |    >>
|     |  \    |   >>>
+     +   \ =====  >>>>"#;

/// Endpoint answering with the latest released version as JSON.
pub const RELEASE_URL: &str = "https://pri-lang.dev/latestVersion";

pub const DOWNLOAD_URL: &str = "https://pri-lang.dev/download";
