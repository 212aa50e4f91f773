use std::collections::HashSet;

pub const BUILTIN_EXERCISES: &[&str] = &[
    "ベンチプレス",
    "スクワット",
    "デッドリフト",
    "ショルダープレス",
    "ラットプルダウン",
    "ベントオーバーロウ",
    "レッグプレス",
    "ダンベルカール",
];

pub fn merge(builtin: &[&str], custom: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();

    builtin
        .iter()
        .map(|name| name.to_string())
        .chain(custom.iter().cloned())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseRegistry {
    custom: Vec<String>,
}

impl ExerciseRegistry {
    pub fn new(custom: Vec<String>) -> Self {
        Self { custom }
    }

    pub fn names(&self) -> Vec<String> {
        merge(BUILTIN_EXERCISES, &self.custom)
    }

    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    pub fn contains(&self, name: &str) -> bool {
        BUILTIN_EXERCISES.contains(&name) || self.custom.iter().any(|custom| custom == name)
    }

    pub fn try_add(&self, name: &str) -> Option<Vec<String>> {
        if name.is_empty() || self.contains(name) {
            return None;
        }

        let mut custom = self.custom.clone();
        custom.push(name.to_string());
        Some(custom)
    }
}
