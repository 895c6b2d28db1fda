//! Helper functions shared by templates, SEO builders and handlers

mod html;
mod url;

pub use self::html::*;
pub use self::url::*;
