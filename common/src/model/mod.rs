pub mod category;
pub mod item;
pub mod nullable;
pub mod product;
pub mod report;
