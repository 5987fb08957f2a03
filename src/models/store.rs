#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub id: Option<i64>,
    pub name: String,
    pub created_at: String,
}

impl Store {
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn find_by_id(stores: &[Store], id: i64) -> Option<&Store> {
        stores.iter().find(|s| s.id == Some(id))
    }
}

impl std::fmt::Display for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
