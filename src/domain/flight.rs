// Flight domain model

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flight {
    pub id: String,
    pub name: String,
}

impl Flight {
    pub fn new(id: String) -> Self {
        let name = Self::format_name(&id);
        Self { id, name }
    }

    fn format_name(id: &str) -> String {
        // Convert "club_launch_" to "club launch"
        id.trim_end_matches('_').replace('_', " ")
    }
}
