//! Resolution of the (screen, device) matrix for a scan
//!
//! The builder never validates names. Unknown devices are reported when the scan
//! looks up their viewport.

use crate::catalog;
use crate::types::MatrixEntry;

/// Build the ordered scan matrix: screen-major, device-minor.
pub fn build_matrix(partner: bool, screen: Option<&str>, device: Option<&str>) -> Vec<MatrixEntry> {
    let screens: Vec<&str> = match screen {
        Some(screen) => vec![screen],
        None => catalog::screens(partner).to_vec(),
    };

    let devices: Vec<&str> = match device {
        Some(device) => vec![device],
        None => catalog::device_names().collect(),
    };

    screens
        .iter()
        .flat_map(|screen| {
            devices
                .iter()
                .map(move |device| MatrixEntry::new(*screen, *device))
        })
        .collect()
}
