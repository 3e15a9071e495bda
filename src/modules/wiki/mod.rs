//! Markdown pages served from the wiki directory

pub mod views;

use log::info;

use crate::app::HookSet;
use crate::config::Config;
use crate::registry::ModuleDescriptor;
use crate::types::PageAssets;

pub fn descriptor(_config: &Config) -> ModuleDescriptor {
    ModuleDescriptor::new()
        .with_init(|ctx| {
            let dir = ctx.config().wiki_path.clone();
            if !dir.is_dir() {
                info!("Creating wiki directory {}", dir.display());
                std::fs::create_dir_all(&dir)?;
            }
            Ok(())
        })
        .with_views(views::routes())
        .with_hooks(HookSet::new().before_request(|_, request| {
            request.extensions_mut().insert(PageAssets::default());
            Ok(())
        }))
}
