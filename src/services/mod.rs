pub mod catalog_writer;
pub mod converter;
pub mod sheet;
