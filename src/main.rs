/*!
 * Call Order Control - Demonstration Driver
 *
 * Deploys a registry and a guarded use case component, then walks a client
 * through the sequence, multiset and overwrite flows:
 * - Sequence: calls must follow the granted order
 * - Multiset: any order, limited per selector
 * - Overwrite: a new grant discards what was left of the old one
 */

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use call_order_control::{
    init_tracing, ClientId, PermissionRegistry, RegistryConfig, UseCaseComponent, UseCaseError,
};

const DEPLOYER: ClientId = ClientId::new([0xde; 20]);
const CLIENT: ClientId = ClientId::new([0xc1; 20]);

fn report(step: &str, component: &UseCaseComponent, result: Result<(), UseCaseError>) {
    match result {
        Ok(()) => info!(step, number = %component.number(), "call executed"),
        Err(e) => warn!(step, error = %e, "call rejected"),
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = RegistryConfig::from_env().context("loading registry configuration")?;
    let registry = Arc::new(PermissionRegistry::with_config(config));
    let component = UseCaseComponent::new(DEPLOYER, Arc::clone(&registry));

    let change = UseCaseComponent::change_data_selector();
    let increment = UseCaseComponent::increment_data_selector();
    info!(%change, %increment, "Selectors derived");

    info!("Sequence flow");
    report("changeData before grant", &component, component.change_data(CLIENT, 1));
    component.call_allow_func_calls_for(DEPLOYER, CLIENT, vec![change, increment, change], true)?;
    report("incrementData out of order", &component, component.increment_data(CLIENT, 1));
    report("changeData", &component, component.change_data(CLIENT, 1));
    report("incrementData", &component, component.increment_data(CLIENT, 1));
    report("changeData", &component, component.change_data(CLIENT, 1));
    report("changeData past end", &component, component.change_data(CLIENT, 1));

    info!("Multiset flow");
    component.call_allow_func_calls_for(DEPLOYER, CLIENT, vec![change, increment, change], false)?;
    report("changeData", &component, component.change_data(CLIENT, 1));
    report("incrementData", &component, component.increment_data(CLIENT, 1));

    info!("Overwrite flow");
    component.call_allow_func_calls_for(DEPLOYER, CLIENT, vec![change, increment, change], false)?;
    report("changeData", &component, component.change_data(CLIENT, 1));
    report("changeData", &component, component.change_data(CLIENT, 1));
    report("changeData over budget", &component, component.change_data(CLIENT, 1));
    report("incrementData", &component, component.increment_data(CLIENT, 1));
    report("incrementData over budget", &component, component.increment_data(CLIENT, 1));

    let stats = registry.event_stats();
    info!(
        grants = stats.total_grants,
        consumed = stats.total_consumed,
        denials = stats.total_denials,
        "Demonstration complete"
    );

    let mut events = registry.events().recent(usize::MAX);
    events.reverse();
    println!(
        "{}",
        serde_json::to_string_pretty(&events).context("serializing event log")?
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&registry.snapshot()).context("serializing snapshot")?
    );

    Ok(())
}
