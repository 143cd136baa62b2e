//! Concrete adapters for the core's collaborator traits.

pub mod local_assets;
pub mod razorpay;
pub mod whatsapp;

pub use local_assets::LocalAssetStore;
pub use razorpay::RazorpayGateway;
pub use whatsapp::WhatsAppMessenger;
