mod lifecycle;
mod pipeline;

use crate::config::ActivationConfig;
use crate::orchestrator::Orchestrator;
use crate::progress::ActivationProgress;
use crate::selection::{CustomModChoice, SkinChoice};
use mock::MockHelper;
use std::sync::{Arc, Mutex};

/// Mock paths do not exist on disk, so path verification is off by default.
fn orchestrator(helper: MockHelper) -> (Orchestrator<MockHelper>, Arc<MockHelper>) {
    let helper = Arc::new(helper);
    let config = ActivationConfig {
        verify_cached_paths: false,
        ..ActivationConfig::default()
    };
    (Orchestrator::with_config(Arc::clone(&helper), config), helper)
}

fn skin(champion_id: u32, skin_id: u32) -> SkinChoice {
    SkinChoice::new(champion_id, format!("Champion {champion_id}"), skin_id, format!("Skin {skin_id}"))
}

fn custom(id: &str) -> CustomModChoice {
    CustomModChoice::new(id, format!("Custom {id}"), format!("/mods/{id}.fantome"))
}

#[derive(Default)]
struct Events(Mutex<Vec<ActivationProgress>>);

impl Events {
    fn sink(&self) -> impl Fn(&ActivationProgress) + Send + Sync + '_ {
        move |progress| self.0.lock().unwrap().push(progress.clone())
    }

    fn all(&self) -> Vec<ActivationProgress> {
        self.0.lock().unwrap().clone()
    }

    fn last(&self) -> ActivationProgress {
        self.all().pop().expect("no progress events")
    }
}
