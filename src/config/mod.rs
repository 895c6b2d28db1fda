//! Configuration module

mod site;

pub use site::AuthorConfig;
pub use site::ContentConfig;
pub use site::Environment;
pub use site::SeoConfig;
pub use site::ServerConfig;
pub use site::SiteConfig;
pub use site::SocialLinks;
pub use site::ViewsConfig;
