use serde::{Deserialize, Serialize};

use super::wire;

/// Coverage plan (`GET /plans`, `GET /plans/active`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: u64,
    pub nombre: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub descripcion: String,
    /// The active-plans endpoint omits the flag
    #[serde(default = "wire::default_true", deserialize_with = "wire::flag")]
    pub activo: bool,
}

impl Plan {
    pub fn draft(&self) -> PlanDraft {
        PlanDraft {
            nombre: self.nombre.clone(),
            descripcion: self.descripcion.clone(),
        }
    }
}

/// Body of plan create/update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanDraft {
    pub nombre: String,
    pub descripcion: String,
}

impl PlanDraft {
    pub fn is_valid(&self) -> bool {
        !self.nombre.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_endpoint_shape_defaults_to_active() {
        let plans: Vec<Plan> =
            serde_json::from_str(r#"[{"id":1,"nombre":"Plan 200"},{"id":2,"nombre":"Plan 300"}]"#)
                .unwrap();
        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.activo));
        assert_eq!(plans[0].descripcion, "");
    }

    #[test]
    fn test_inactive_flag_from_tinyint() {
        let plan: Plan =
            serde_json::from_str(r#"{"id":4,"nombre":"Viejo","descripcion":null,"activo":0}"#)
                .unwrap();
        assert!(!plan.activo);
    }

    #[test]
    fn test_draft_requires_name() {
        assert!(!PlanDraft::default().is_valid());
        let plan = Plan {
            id: 1,
            nombre: "Plan 400".to_string(),
            descripcion: String::new(),
            activo: true,
        };
        assert!(plan.draft().is_valid());
    }
}
