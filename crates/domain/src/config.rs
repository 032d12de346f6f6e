/// Settings shared by the mutation workflows. Built once at startup and
/// handed to each service constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Public base URL under which uploaded blobs are served.
    pub assets_base_url: String,
    /// Base URL of the web frontend, used for share card pages.
    pub frontend_base_url: String,
    pub mail_from_address: String,
    pub bucket: String,
    pub testimonial_folder: String,
    pub max_quote_length: usize,
    /// Edge length in pixels of the small monochrome rendition.
    pub small_image_edge: u32,
    pub share_card_width: u32,
    pub share_card_height: u32,
    pub testimonial_mail_template: String,
    pub testimonial_mail_subject: String,
    pub pledge_mail_template: String,
    pub pledge_mail_subject: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            assets_base_url: "http://127.0.0.1:9000/assets".to_string(),
            frontend_base_url: "http://127.0.0.1:3005".to_string(),
            mail_from_address: "noreply@example.org".to_string(),
            bucket: "patronage".to_string(),
            testimonial_folder: "testimonials".to_string(),
            max_quote_length: 140,
            small_image_edge: 256,
            share_card_width: 1200,
            share_card_height: 628,
            testimonial_mail_template: "cf_community".to_string(),
            testimonial_mail_subject: "Your testimonial is live".to_string(),
            pledge_mail_template: "cf_pledge".to_string(),
            pledge_mail_subject: "Thank you for your pledge".to_string(),
        }
    }
}

impl WorkflowConfig {
    pub fn asset_url(&self, path: &str) -> String {
        format!("{}{}", self.assets_base_url.trim_end_matches('/'), path)
    }

    pub fn original_image_path(&self, testimonial_id: &str) -> String {
        format!("/{}/{testimonial_id}_original.jpeg", self.testimonial_folder)
    }

    pub fn small_image_path(&self, testimonial_id: &str) -> String {
        let edge = self.small_image_edge;
        format!(
            "/{}/{testimonial_id}_{edge}x{edge}.jpeg",
            self.testimonial_folder
        )
    }

    pub fn share_card_path(&self, testimonial_id: &str) -> String {
        format!("/{}/sm/{testimonial_id}_sm.png", self.testimonial_folder)
    }

    pub fn share_page_url(&self, testimonial_id: &str) -> String {
        format!(
            "{}/community?share={testimonial_id}",
            self.frontend_base_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_paths_are_keyed_by_id_and_dimensions() {
        let config = WorkflowConfig::default();
        assert_eq!(
            config.original_image_path("abc"),
            "/testimonials/abc_original.jpeg"
        );
        assert_eq!(
            config.small_image_path("abc"),
            "/testimonials/abc_256x256.jpeg"
        );
        assert_eq!(config.share_card_path("abc"), "/testimonials/sm/abc_sm.png");
    }

    #[test]
    fn urls_tolerate_trailing_slashes() {
        let config = WorkflowConfig {
            assets_base_url: "https://assets.example.org/".to_string(),
            frontend_base_url: "https://www.example.org/".to_string(),
            ..WorkflowConfig::default()
        };
        assert_eq!(
            config.asset_url("/testimonials/abc_256x256.jpeg"),
            "https://assets.example.org/testimonials/abc_256x256.jpeg"
        );
        assert_eq!(
            config.share_page_url("abc"),
            "https://www.example.org/community?share=abc"
        );
    }
}
