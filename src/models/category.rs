pub const DEFAULT_CATEGORY: &str = "Other";

/// Color used for categories that are not in the predefined table.
pub const DEFAULT_COLOR: &str = "#AED6F1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub color: &'static str,
}

pub const PREDEFINED: &[Category] = &[
    Category { name: "Food & Dining", color: "#FF6B6B" },
    Category { name: "Transportation", color: "#4ECDC4" },
    Category { name: "Shopping", color: "#45B7D1" },
    Category { name: "Entertainment", color: "#96CEB4" },
    Category { name: "Bills & Utilities", color: "#FFEAA7" },
    Category { name: "Healthcare", color: "#DDA0DD" },
    Category { name: "Education", color: "#98D8C8" },
    Category { name: "Travel", color: "#F7DC6F" },
    Category { name: "Groceries", color: "#BB8FCE" },
    Category { name: DEFAULT_CATEGORY, color: DEFAULT_COLOR },
];

impl Category {
    /// Find a predefined category by exact name.
    pub fn find_by_name(name: &str) -> Option<&'static Category> {
        PREDEFINED.iter().find(|c| c.name == name)
    }

    /// Presentation color for a free-form category name.
    pub fn color_for(name: &str) -> &'static str {
        Self::find_by_name(name).map_or(DEFAULT_COLOR, |c| c.color)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
