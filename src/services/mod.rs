pub mod answer_collector;
pub mod attempt_service;
pub mod attempt_session;
pub mod authoring_service;
pub mod catalog_service;
pub mod credentials;
pub mod scoring_service;
pub mod store;
pub mod timer;
