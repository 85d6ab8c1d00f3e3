//! Static page text loaded from `content/*.txt` at compile time.
//! Edit the .txt files to change wording without touching Rust code.

macro_rules! include_content {
    ($name:literal) => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/src/content/",
            $name,
            ".txt"
        ))
    };
}

pub const APP_TITLE: &str = "☕ Starbucks Dataset Explorer";
pub const HOME_SUBTITLE: &str = "Welcome to our Starbucks dataset explorer app!";
pub const NAV_HINT: &str = "👈 Use the sidebar to navigate between different sections.";
pub const OVERVIEW_TITLE: &str = "💚 Data Overview";
pub const EDA_TITLE: &str = "📊 Exploratory Data Analysis (EDA)";
pub const EDA_SUBTITLE: &str = "Be a Data Barista: Select Your Visualization Ingredients:";
pub const DATASET_DESCRIPTION: &str =
    "This dataset provides a nutritional breakdown of Starbucks beverages.";

/// An image the original pages show. Terminals get the caption and the address.
pub struct ImageRef {
    pub url: &'static str,
    pub caption: &'static str,
}

pub const LOGO: ImageRef = ImageRef {
    url: "https://1000logos.net/wp-content/uploads/2023/04/Starbucks-logo-500x281.png",
    caption: "Starbucks' Siren Logo",
};

pub const MOTTO: ImageRef = ImageRef {
    url: "https://starbucksjobs.de/assets/Uploads/4d7e59639c/002-de.jpg",
    caption: "Starbucks Motto: To inspire and nurture the human spirit - one person, one cup, and one neighborhood at a time.",
};

pub fn home() -> &'static str {
    include_content!("home")
}

pub fn about() -> &'static str {
    include_content!("about")
}

pub fn help_home() -> &'static str {
    include_content!("help_home")
}

pub fn help_overview() -> &'static str {
    include_content!("help_overview")
}

pub fn help_eda() -> &'static str {
    include_content!("help_eda")
}

/// "The dataset contains N rows and M columns."
pub fn shape_line((rows, columns): (usize, usize)) -> String {
    format!("The dataset contains {rows} rows and {columns} columns.")
}
