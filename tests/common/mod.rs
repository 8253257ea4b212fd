use promo_report::{DataLoader, Dataset};
use std::io::Write;
use tempfile::NamedTempFile;

#[allow(dead_code)]
pub const HEADER: &str = "Region,Store Code,Store Name,Store Brand,Item Code,Description,Unit Size,Price,Start Date,End Date,Language,SPM Code,Reused SPM,PB Available,Store Halal,Product Non-Halal";

pub const SAMPLE_CSV: &str = "\
Region,Store Code,Store Name,Store Brand,Item Code,Description,Unit Size,Price,Start Date,End Date,Language,SPM Code,Reused SPM,PB Available,Store Halal,Product Non-Halal
Region1,S1001,Store A,Brand X,I101,Item Description 1,500g,9.99,2025-01-01,2025-01-15,EN,SPM001,Yes,Yes,No,No
Region1,S1002,Store B,Brand X,I101,Item Description 1,500g,9.99,2025-01-01,2025-01-15,EN,SPM002,No,Yes,Yes,No
Region1,S1002,Store B,Brand X,I102,Item Description 2,300g,5.99,2025-01-01,2025-01-15,FR,SPM003,No,No,Yes,No
Region2,S2001,Store C,Brand Y,I101,Item Description 1,500g,10.99,2025-01-01,2025-01-15,EN,SPM004,No,Yes,No,Yes
Region2,S2001,Store C,Brand Y,I103,Item Description 3,1kg,15.99,2025-01-01,2025-01-15,ES,,No,No,No,Yes
";

#[allow(dead_code)]
pub fn sample_dataset() -> Dataset {
    DataLoader::new()
        .load_reader(SAMPLE_CSV.as_bytes())
        .unwrap()
}

#[allow(dead_code)]
pub fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
