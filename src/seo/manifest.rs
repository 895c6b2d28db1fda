//! Web app manifest

use serde::Serialize;

use crate::config::SiteConfig;

#[derive(Debug, Clone, Serialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebManifest {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: String,
    pub background_color: String,
    pub theme_color: String,
    pub icons: Vec<ManifestIcon>,
}

pub fn web_manifest(config: &SiteConfig) -> WebManifest {
    WebManifest {
        name: config.title.clone(),
        short_name: config.name.clone(),
        description: config.description.clone(),
        start_url: "/".to_string(),
        display: "standalone".to_string(),
        background_color: "#ffffff".to_string(),
        theme_color: config.theme_color.clone(),
        icons: vec![ManifestIcon {
            src: "/favicon.svg".to_string(),
            sizes: "any".to_string(),
            mime_type: "image/svg+xml".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json() {
        let config = SiteConfig::default();
        let value = serde_json::to_value(web_manifest(&config)).unwrap();
        assert_eq!(value["short_name"], config.name.as_str());
        assert_eq!(value["display"], "standalone");
        assert_eq!(value["theme_color"], "#4F46E5");
        assert_eq!(value["icons"][0]["type"], "image/svg+xml");
    }
}
