//! Node host bridge.
//!
//! An editor extension calls `process_layout_native` from its save handler. One
//! `Generator` is kept per workspace so the import table is scanned only once per
//! process.

use napi_derive::napi;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::pipeline::Generator;

static GENERATORS: Lazy<Mutex<HashMap<PathBuf, Arc<Generator>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn generator_for(workspace: &Path) -> napi::Result<Arc<Generator>> {
    let mut generators = GENERATORS
        .lock()
        .map_err(|_| napi::Error::from_reason("generator registry poisoned"))?;
    if let Some(generator) = generators.get(workspace) {
        return Ok(Arc::clone(generator));
    }

    let generator = Generator::load(workspace)
        .map(Arc::new)
        .map_err(|e| napi::Error::from_reason(format!("Configuration error: {}", e)))?;
    generators.insert(workspace.to_path_buf(), Arc::clone(&generator));
    Ok(generator)
}

/// Process one saved file and return the `ProcessReport` as JSON.
#[napi]
pub fn process_layout_native(workspace: String, file_path: String) -> napi::Result<String> {
    let generator = generator_for(Path::new(&workspace))?;
    let report = generator.process_layout(Path::new(&file_path));
    serde_json::to_string(&report)
        .map_err(|e| napi::Error::from_reason(format!("Serialize error: {}", e)))
}

/// Forget cached generators, e.g. after `layoutgen.json` or `node_modules` changed.
#[napi]
pub fn clear_generators_native() -> napi::Result<()> {
    GENERATORS
        .lock()
        .map_err(|_| napi::Error::from_reason("generator registry poisoned"))?
        .clear();
    Ok(())
}
