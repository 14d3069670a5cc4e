use crate::types::{FrameRecord, PrescriptionRecord};

/// Expand records into cumulative animation frames.
///
/// For every distinct year `Y` the output holds all records with
/// `year <= Y`, tagged with frame `Y`. Frames come out in ascending order and
/// keep the input order within a frame. Output grows quadratically in the
/// number of years, which stays small (2006-2024).
pub fn cumulative_frames(records: &[PrescriptionRecord]) -> Vec<FrameRecord> {
    let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();

    years
        .iter()
        .flat_map(|&frame| {
            records
                .iter()
                .filter(move |r| r.year <= frame)
                .map(move |r| FrameRecord {
                    frame,
                    record: r.clone(),
                })
        })
        .collect()
}
