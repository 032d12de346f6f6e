pub mod blob;
pub mod cdn;
pub mod http;
pub mod images;
pub mod mail;
pub mod ops;
pub mod renderer;

pub use blob::BlobStorageClient;
pub use cdn::CdnClient;
pub use http::EffectHttp;
pub use images::ImageServiceClient;
pub use mail::TemplateMailClient;
pub use ops::OpsWebhookNotifier;
pub use renderer::RendererClient;
