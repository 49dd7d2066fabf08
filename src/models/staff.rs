//! Departments, positions, employees and the signed-in user's profile

use serde::{Deserialize, Serialize};

/// Department
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

/// Position within a department
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub department: Option<i64>,
}

/// Employee record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Department name or id, depending on the serializer
    #[serde(default)]
    pub department: Option<serde_json::Value>,
    #[serde(default)]
    pub position: Option<serde_json::Value>,
    #[serde(default)]
    pub date_joined: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        [
            Some(self.last_name.as_str()),
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Signed-in user profile (`/auth/profile/`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_employee_full_name_skips_missing_parts() {
        let emp: Employee = serde_json::from_value(json!({
            "id": 4,
            "last_name": "Koval",
            "first_name": "Olena",
            "middle_name": "",
            "department": "Assembly"
        }))
        .unwrap();
        assert_eq!(emp.full_name(), "Koval Olena");
    }
}
