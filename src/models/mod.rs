mod category;
mod import_batch;
mod parsed_row;
mod product;
mod sale;
mod store;

pub use category::Category;
pub use import_batch::{week_start, ImportBatch, ImportStatus};
pub use parsed_row::ParsedRow;
pub use product::{CatalogProduct, StorePrice};
pub use sale::Sale;
pub use store::Store;
