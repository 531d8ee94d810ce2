/// Messaging channel adapters for EduBot.
///
/// Each adapter implements [`edubot_types::ChannelAdapter`] for outbound
/// delivery and exposes the helpers its webhook needs (subscription checks,
/// signature verification, payload parsing).
pub mod whatsapp;

pub use whatsapp::WhatsAppChannel;
