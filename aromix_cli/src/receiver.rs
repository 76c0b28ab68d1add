//! Receiver assembly: config mapping, hardware selection, and the run,
//! recipe-listing, and self-check commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use eyre::WrapErr;

use aromix_config::Config;
use aromix_core::actuator::ActuatorDriver;
use aromix_core::inlet::LinkPump;
use aromix_core::mocks::MemoryStore;
use aromix_core::recipe::RecipeStore;
use aromix_core::{
    FileRecipeStore, Link, OdorDetection, OdorId, Receiver, RecipeCatalog, RunParams, SystemStatus,
};
use aromix_hardware::{ScriptedTransport, SimulatedActuators};
use aromix_traits::clock::{Clock, MonotonicClock};

pub struct RunOpts {
    pub iterations: Option<usize>,
    pub direct: bool,
    pub demo: Option<String>,
    pub intensity: u8,
    pub duration_s: u16,
    pub status_json: bool,
}

#[cfg(feature = "hardware")]
mod pins {
    pub const PUMPS: [u8; 5] = [12, 13, 18, 19, 26];
    pub const VALVES: [u8; 5] = [5, 6, 16, 20, 21];
    pub const FANS: [u8; 2] = [23, 24];
}

pub fn run(cfg: &Config, opts: RunOpts) -> eyre::Result<()> {
    #[cfg(feature = "hardware")]
    let bank = aromix_hardware::GpioActuators::new(&pins::PUMPS, &pins::VALVES, &pins::FANS)
        .map_err(eyre::Report::new)
        .wrap_err("claim actuator GPIO pins")?;
    #[cfg(not(feature = "hardware"))]
    let bank = SimulatedActuators::new();

    assemble_and_run(bank, cfg, opts)
}

fn assemble_and_run<A: aromix_traits::Actuators>(
    bank: A,
    cfg: &Config,
    opts: RunOpts,
) -> eyre::Result<()> {
    let params = RunParams::from(cfg);
    let catalog = RecipeCatalog::new(recipe_store(cfg));

    let mut transport = ScriptedTransport::new();
    if let Some(name) = &opts.demo {
        let odor = odor_by_name(name)?;
        let detection = OdorDetection {
            odor,
            confidence: 1.0,
            intensity: opts.intensity,
        };
        let cmd = detection.into_command(opts.duration_s, 0);
        transport.enqueue(cmd.encode());
        tracing::info!(
            odor = odor.raw(),
            intensity = opts.intensity,
            duration_s = opts.duration_s,
            "demo command queued"
        );
    }

    let direct = opts.direct || matches!(cfg.runner.mode, aromix_config::LinkMode::Direct);
    let link = if direct {
        Link::Direct(Box::new(transport))
    } else {
        Link::Queued(LinkPump::spawn(
            transport,
            cfg.runner.loop_delay_ms,
            MonotonicClock::new(),
        ))
    };

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let mut receiver = Receiver::new(bank, catalog, link, clock, params);

    match opts.iterations {
        Some(n) => receiver.run_iterations(n),
        None => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("install Ctrl-C handler")?;
            receiver.run(&shutdown);
        }
    }

    if opts.status_json {
        print_status_json(&receiver.status());
    }
    Ok(())
}

fn recipe_store(cfg: &Config) -> Box<dyn RecipeStore> {
    match &cfg.recipes.path {
        Some(path) => Box::new(FileRecipeStore::new(path)),
        None => Box::new(MemoryStore::default()),
    }
}

fn odor_by_name(name: &str) -> eyre::Result<OdorId> {
    let odor = match name.to_ascii_lowercase().as_str() {
        "coffee" => OdorId::COFFEE,
        "alcohol" => OdorId::ALCOHOL,
        "lemon" => OdorId::LEMON,
        "mint" => OdorId::MINT,
        "lavender" => OdorId::LAVENDER,
        "mixed" => OdorId::MIXED,
        other => {
            let raw: u8 = other
                .parse()
                .wrap_err_with(|| format!("unknown odor '{other}'"))?;
            OdorId::new(raw)
        }
    };
    if !odor.is_known() {
        eyre::bail!("odor id {:#04x} outside the addressable range", odor.raw());
    }
    Ok(odor)
}

pub fn list_recipes(cfg: &Config) -> eyre::Result<()> {
    let catalog = RecipeCatalog::new(recipe_store(cfg));
    println!(
        "{:<6} {:<12} {:<20} {:>4} {:>7}",
        "id", "name", "pump ratios", "fan", "mix ms"
    );
    for recipe in catalog.all() {
        println!(
            "{:#04x}  {:<12} {:<20} {:>3}% {:>7}",
            recipe.odor.raw(),
            recipe.name,
            format!("{:?}", recipe.pump_ratios),
            recipe.fan_speed,
            recipe.mixing_time_ms,
        );
    }
    Ok(())
}

pub fn self_check() -> eyre::Result<()> {
    let mut driver = ActuatorDriver::new(SimulatedActuators::new());
    driver
        .set_pump_speed(0, 25)
        .map_err(eyre::Report::new)
        .wrap_err("exercise pump 0")?;
    driver.emergency_stop();
    if !driver.snapshot().is_all_off() {
        eyre::bail!("self-check failed: actuators did not reach the all-off state");
    }
    println!("self-check ok");
    Ok(())
}

fn print_status_json(status: &SystemStatus) {
    let line = serde_json::json!({
        "state": format!("{:?}", status.state),
        "error_count": status.error_count,
        "uptime_s": status.uptime_s,
        "pumps": status.pump_status,
        "valves": status.valve_status,
        "communication_active": status.communication_active,
    });
    println!("{line}");
}
