pub mod sink;
pub mod tabular;
pub mod vendor_files;

pub use sink::{DataSink, SinkError};
pub use tabular::{CsvSink, csv_file_name, read_dataset};
pub use vendor_files::{VendorFileStore, VendorSeries};
