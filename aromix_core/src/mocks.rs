//! Test and helper mocks for aromix_core

use crate::recipe::{Recipe, RecipeStore};

/// An actuator bank that accepts every command; useful when a test only
/// inspects the driver's commanded state.
pub struct NullActuators;

impl aromix_traits::Actuators for NullActuators {
    fn set_pump(
        &mut self,
        _id: u8,
        _percent: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
    fn set_valve(
        &mut self,
        _id: u8,
        _open: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
    fn set_fan(
        &mut self,
        _id: u8,
        _percent: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// A transport with no link attached: nothing arrives, sends vanish.
pub struct NullTransport;

impl aromix_traits::Transport for NullTransport {
    fn receive_frame(
        &mut self,
    ) -> Result<Option<[u8; aromix_traits::FRAME_LEN]>, Box<dyn std::error::Error + Send + Sync>>
    {
        Ok(None)
    }
    fn send_frame(
        &mut self,
        _frame: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// In-memory recipe store. `fail_saves` simulates broken persistence to
/// exercise the fire-and-forget path.
#[derive(Default)]
pub struct MemoryStore {
    pub recipes: Vec<Recipe>,
    pub fail_saves: bool,
    pub save_count: usize,
}

impl RecipeStore for MemoryStore {
    fn load(&mut self) -> eyre::Result<Vec<Recipe>> {
        Ok(self.recipes.clone())
    }

    fn save(&mut self, recipes: &[Recipe]) -> eyre::Result<()> {
        self.save_count += 1;
        if self.fail_saves {
            eyre::bail!("simulated storage failure");
        }
        self.recipes = recipes.to_vec();
        Ok(())
    }
}

/// Handle to a [`MemoryStore`] that stays inspectable after the catalog
/// has taken ownership of its boxed clone.
#[derive(Clone, Default)]
pub struct SharedStore(pub std::sync::Arc<std::sync::Mutex<MemoryStore>>);

impl RecipeStore for SharedStore {
    fn load(&mut self) -> eyre::Result<Vec<Recipe>> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| eyre::eyre!("store mutex poisoned"))?;
        guard.load()
    }

    fn save(&mut self, recipes: &[Recipe]) -> eyre::Result<()> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| eyre::eyre!("store mutex poisoned"))?;
        guard.save(recipes)
    }
}
