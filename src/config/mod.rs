//! Configuration module

mod site;

pub use site::HighlightConfig;
pub use site::Mode;
pub use site::RenderConfig;
pub use site::SiteConfig;
pub use site::SiteMetadata;
pub use site::SocialConfig;
pub use site::MODE_ENV;
