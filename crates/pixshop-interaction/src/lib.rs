//! Clients for the hosted image generation service.

pub mod gemini_image_service;

pub use gemini_image_service::GeminiImageService;
