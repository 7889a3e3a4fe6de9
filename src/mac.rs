// SPDX-License-Identifier: Apache-2.0

pub(crate) fn mac_to_string(mac: &[u8]) -> String {
    mac.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<String>>()
        .join(":")
}
