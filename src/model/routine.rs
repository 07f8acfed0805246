use crate::schema::{RoutineMeta, RoutineType};

#[derive(Debug, Clone)]
pub struct RoutineParameter {
    pub name: Option<String>,
    pub type_name: String,
    pub mode: String,
}

/// A stored procedure or function.
#[derive(Debug, Clone)]
pub struct Routine {
    pub name: String,
    pub routine_type: RoutineType,
    pub return_type: Option<String>,
    pub language: Option<String>,
    pub definition: Option<String>,
    pub is_deterministic: bool,
    pub security_type: Option<String>,
    pub comment: Option<String>,
    pub parameters: Vec<RoutineParameter>,
}

impl Routine {
    pub fn is_procedure(&self) -> bool {
        self.routine_type == RoutineType::Procedure
    }
}

impl From<RoutineMeta> for Routine {
    fn from(meta: RoutineMeta) -> Self {
        Self {
            name: meta.name,
            routine_type: meta.routine_type,
            return_type: meta.return_type,
            language: meta.language,
            definition: meta.definition,
            is_deterministic: meta.is_deterministic,
            security_type: meta.security_type,
            comment: meta.comment,
            parameters: meta
                .parameters
                .into_iter()
                .map(|p| RoutineParameter {
                    name: p.name,
                    type_name: p.type_name,
                    mode: p.mode,
                })
                .collect(),
        }
    }
}
