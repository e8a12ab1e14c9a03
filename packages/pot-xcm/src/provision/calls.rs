//! Sponsorship pallet call encoding
//!
//! Arguments are plain SCALE (quotas are not compact in the pallet's call
//! signatures); indices come from the [`CallIndexTable`].

use crate::calls::CallIndexTable;
use crate::codec::encode_call;
use crate::types::ProvisionSettings;
use parity_scale_codec::{Compact, Encode};

/// `Sponsorship.create_pot(pot, sponsorship_type, fee_quota, reserve_quota)`
pub(crate) fn create_pot(
    table: &CallIndexTable,
    settings: &ProvisionSettings,
    pot_id: u32,
) -> Vec<u8> {
    let args = (
        pot_id,
        settings.sponsorship_type,
        settings.pot_fee_quota,
        settings.pot_reserve_quota,
    )
        .encode();
    encode_call(table.create_pot, &args)
}

/// `Sponsorship.register_users(pot, users, common_fee_quota, common_reserve_quota)`
pub(crate) fn register_users(
    table: &CallIndexTable,
    settings: &ProvisionSettings,
    pot_id: u32,
    users: &[[u8; 32]],
) -> Vec<u8> {
    let args = (
        pot_id,
        users,
        settings.user_fee_quota,
        settings.user_reserve_quota,
    )
        .encode();
    encode_call(table.register_users, &args)
}

/// `Utility.batch_all(calls)`
pub(crate) fn batch_all(table: &CallIndexTable, calls: Vec<Vec<u8>>) -> Vec<u8> {
    let mut result = vec![table.batch_all.pallet, table.batch_all.call];
    Compact(calls.len() as u32).encode_to(&mut result);
    for call in calls {
        result.extend(call);
    }
    result
}
