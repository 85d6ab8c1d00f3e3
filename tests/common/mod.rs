#![allow(dead_code)]

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Write a small beverage table to `dir/name` and return its path.
///
/// `Caffeine (mg)` mixes numbers with "Varies" and is read as text.
/// One `Sugars (g)` value is missing.
pub fn write_beverage_csv(dir: &Path, name: &str) -> PathBuf {
    let mut df = beverage_frame();
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
    path
}

pub fn beverage_frame() -> DataFrame {
    df!(
        "Beverage_category" => [
            "Coffee", "Classic Espresso Drinks", "Classic Espresso Drinks",
            "Signature Espresso Drinks", "Tazo Tea Drinks", "Coffee",
        ],
        "Beverage" => [
            "Brewed Coffee", "Caffe Latte", "Caffe Latte",
            "White Chocolate Mocha", "Tazo Chai Tea Latte", "Brewed Coffee",
        ],
        "Beverage_prep" => ["Short", "Tall Nonfat Milk", "Grande 2% Milk", "Venti Soymilk", "Tall Soymilk", "Venti"],
        "Calories" => [3i64, 100, 190, 450, 170, 5],
        "Sugars (g)" => [Some(0.0f64), Some(14.0), Some(17.0), None, Some(32.0), Some(0.0)],
        "Caffeine (mg)" => ["175", "75", "150", "Varies", "70", "410"],
    )
    .unwrap()
}

/// Rows and columns of [`beverage_frame`].
pub const BEVERAGE_SHAPE: (usize, usize) = (6, 6);
