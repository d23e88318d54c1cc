use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central as _, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::{Stream, StreamExt as _};
use log::{debug, info};
use tokio::time::{Instant, timeout_at};

use crate::advertisement::ScanResult;
use crate::scanner::{ScanSource, SourceClosed};

type EventStream = Pin<Box<dyn Stream<Item = CentralEvent> + Send>>;

/// Scan primitive backed by a btleplug adapter.
///
/// Scanning runs continuously; a pass collects the manufacturer data
/// advertisements that arrive within `window`.
pub struct BtleScanSource {
    adapter: Adapter,
    events: EventStream,
    window: Duration,
}

pub async fn first_adapter() -> anyhow::Result<Adapter> {
    let bt_manager = Manager::new().await?;
    bt_manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no Bluetooth adapter found"))
}

impl BtleScanSource {
    pub async fn start(adapter: Adapter, window: Duration) -> anyhow::Result<Self> {
        let events = adapter.events().await?;
        adapter.start_scan(ScanFilter::default()).await?;
        info!("BLE scan started ({}ms passes)", window.as_millis());
        Ok(BtleScanSource {
            adapter,
            events,
            window,
        })
    }
}

async fn to_results(
    adapter: &Adapter,
    id: &PeripheralId,
    manufacturer_data: HashMap<u16, Vec<u8>>,
) -> anyhow::Result<Vec<ScanResult>> {
    let peripheral = adapter.peripheral(id).await?;
    let Some(properties) = peripheral.properties().await? else {
        return Ok(Vec::new());
    };

    let rssi = properties.rssi.map(clamp_rssi).unwrap_or(i8::MIN);
    let address = properties.address.to_string();

    let mut entries: Vec<_> = manufacturer_data.into_iter().collect();
    entries.sort_by_key(|(company_id, _)| *company_id);

    Ok(entries
        .into_iter()
        .map(|(company_id, data)| ScanResult {
            name: properties.local_name.clone(),
            payload: raw_payload(company_id, &data),
            rssi,
            address: address.clone(),
        })
        .collect())
}

#[async_trait]
impl ScanSource for BtleScanSource {
    async fn scan(&mut self, max_results: usize) -> anyhow::Result<Vec<ScanResult>> {
        let deadline = Instant::now() + self.window;
        let mut results = Vec::with_capacity(max_results);

        while results.len() < max_results {
            let event = match timeout_at(deadline, self.events.next()).await {
                Ok(Some(event)) => event,
                Ok(None) => return Err(SourceClosed.into()),
                Err(_) => break,
            };

            if let CentralEvent::ManufacturerDataAdvertisement {
                id,
                manufacturer_data,
            } = event
            {
                let lookup = to_results(&self.adapter, &id, manufacturer_data);
                match timeout_at(deadline, lookup).await {
                    Ok(Ok(found)) => results.extend(found),
                    Ok(Err(err)) => debug!("Error reading peripheral {:?}: {:?}", id, err),
                    Err(_) => break,
                }
            }
        }

        results.truncate(max_results);
        Ok(results)
    }
}

/// Rebuilds the AD payload as broadcast: little-endian company id, then data.
fn raw_payload(company_id: u16, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(data.len() + 2);
    payload.extend_from_slice(&company_id.to_le_bytes());
    payload.extend_from_slice(data);
    payload
}

fn clamp_rssi(rssi: i16) -> i8 {
    rssi.clamp(i16::from(i8::MIN), i16::from(i8::MAX)) as i8
}
