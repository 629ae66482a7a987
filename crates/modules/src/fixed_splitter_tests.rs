// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use conflux_core::{FileRef, InputEntry};
use indexmap::IndexMap;
use serde_json::json;

fn main_input(n: usize) -> InputBundle {
    let files = (0..n).map(|i| FileRef::new(format!("f{i}"), "fastq", format!("/in/r{i}.fastq"))).collect();
    InputBundle::new(vec![InputEntry::MainInput(files)])
}

#[test]
fn splits_files_evenly_across_requested_count() {
    let splitter = FixedSplitter::from_params(
        "split",
        &json!({"split_key": "fastq", "num_splits": 2}),
    )
    .unwrap();

    let output = splitter.collect_output(&main_input(4), "", "").unwrap();
    match output {
        OutputBundle::Split(splits) => {
            assert_eq!(splits.len(), 2);
            for record in splits.values() {
                match record.values.get(&DataKey::from("fastq")).unwrap() {
                    OutputValue::List(items) => assert_eq!(items.len(), 2),
                    other => panic!("expected a List value, got {other:?}"),
                }
            }
        }
        other => panic!("expected a Split bundle, got {other:?}"),
    }
}

#[test]
fn fewer_files_than_splits_yields_fewer_splits() {
    let splitter = FixedSplitter::from_params(
        "split",
        &json!({"split_key": "fastq", "num_splits": 5}),
    )
    .unwrap();

    let output = splitter.collect_output(&main_input(2), "", "").unwrap();
    match output {
        OutputBundle::Split(splits) => assert_eq!(splits.len(), 2),
        other => panic!("expected a Split bundle, got {other:?}"),
    }
}

#[test]
fn passthrough_keys_are_copied_into_every_split() {
    let splitter = FixedSplitter::from_params(
        "split",
        &json!({"split_key": "fastq", "num_splits": 2, "passthrough": ["ref_fasta"]}),
    )
    .unwrap();

    let mut input = main_input(4);
    input.0.push(InputEntry::Keyed(IndexMap::from([(
        DataKey::from("ref_fasta"),
        OutputValue::File(FileRef::new("ref", "ref_fasta", "/ref/genome.fa")),
    )])));

    let output = splitter.collect_output(&input, "", "").unwrap();
    match output {
        OutputBundle::Split(splits) => {
            for record in splits.values() {
                assert!(record.values.contains_key(&DataKey::from("ref_fasta")));
            }
        }
        other => panic!("expected a Split bundle, got {other:?}"),
    }
}

#[test]
fn zero_splits_is_rejected_at_construction() {
    let result = FixedSplitter::from_params("split", &json!({"split_key": "fastq", "num_splits": 0}));
    assert!(result.is_err());
}

#[test]
fn missing_split_key_fails_collect_output() {
    let splitter = FixedSplitter::from_params(
        "split",
        &json!({"split_key": "fastq", "num_splits": 2}),
    )
    .unwrap();
    let empty = InputBundle::new(vec![]);
    assert!(splitter.collect_output(&empty, "", "").is_err());
}
