//! Kernel cpu-list parsing (`0-3,6,8-9`).

use crate::core::pool::UnitId;

/// Highest cpu id accepted, matching the kernel's largest `NR_CPUS`.
pub const MAX_CPU_ID: UnitId = 8191;

/// Parse a kernel cpu list into ascending, de-duplicated unit ids.
///
/// # Errors
///
/// Returns a message naming the offending chunk when the list is malformed
/// or names a cpu above [`MAX_CPU_ID`].
pub fn parse_cpu_list(input: &str) -> Result<Vec<UnitId>, String> {
    let mut units = Vec::new();
    for chunk in input.trim().split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let (low, high) = match chunk.split_once('-') {
            Some((a, b)) => (parse_id(a, chunk)?, parse_id(b, chunk)?),
            None => {
                let id = parse_id(chunk, chunk)?;
                (id, id)
            }
        };
        if low > high {
            return Err(format!("descending range `{chunk}`"));
        }
        units.extend(low..=high);
    }
    units.sort_unstable();
    units.dedup();
    Ok(units)
}

fn parse_id(raw: &str, chunk: &str) -> Result<UnitId, String> {
    let id: UnitId = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid cpu id in `{chunk}`"))?;
    if id > MAX_CPU_ID {
        return Err(format!("cpu id {id} in `{chunk}` exceeds {MAX_CPU_ID}"));
    }
    Ok(id)
}
