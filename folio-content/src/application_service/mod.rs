pub mod content_service;
