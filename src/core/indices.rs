use hashbrown::HashMap;

use crate::types::OperationId;

/// Key to operation ids, in insertion order.
pub type VecIndex<K> = HashMap<K, Vec<OperationId>>;

/// Removes the first occurrence of `id` from `v`.
pub fn remove_from_vec_index(v: &mut Vec<OperationId>, id: OperationId) {
    if let Some(pos) = v.iter().position(|x| *x == id) {
        v.remove(pos);
    }
}
