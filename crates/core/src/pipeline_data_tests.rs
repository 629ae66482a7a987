// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn derives_keys_from_file_types() {
    let data = StaticPipelineData::new(vec![
        FileRef::new("f1", "fastq", "/in/r1.fastq"),
        FileRef::new("f2", "ref_fasta", "/ref/genome.fa"),
    ]);
    let keys = data.main_input_keys();
    assert!(keys.contains(&DataKey::from("fastq")));
    assert!(keys.contains(&DataKey::from("ref_fasta")));
    assert_eq!(data.main_input_files().len(), 2);
}
