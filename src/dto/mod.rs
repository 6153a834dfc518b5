pub mod authoring_dto;
pub mod store_dto;
