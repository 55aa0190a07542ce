#![cfg(test)]
use laid_cover::bits::{set_bit, words_for_bits};
use laid_cover::dataset::{read_field, write_field, Dataset};
use laid_cover::jnsq::{apply_jnsq, bits_for_classes, JnsqOptions};

fn dataset_from_rows(rows: &[(Vec<bool>, usize)], k: usize) -> Dataset {
    let a = rows[0].0.len();
    let c = bits_for_classes(k);
    let w = words_for_bits(a + c);
    let mut words = vec![0u64; rows.len() * w];
    for (i, (attrs, class)) in rows.iter().enumerate() {
        let row = &mut words[i * w..(i + 1) * w];
        for (j, bit) in attrs.iter().enumerate() {
            set_bit(row, j, *bit);
        }
        write_field(row, a, c, *class as u64, false);
    }
    Dataset::new(words, rows.len(), w, a, c, k)
}

/// spec.md §8 scenario 3: two exact duplicates in the same class are
/// removed by dedup; class counts reflect the removal.
#[test]
fn duplicate_rows_in_the_same_class_are_removed() {
    let mut ds = dataset_from_rows(
        &[(vec![true, false, false], 0), (vec![true, false, false], 0), (vec![false, true, true], 1)],
        2,
    );
    let removed = ds.prepare().unwrap();
    assert_eq!(removed, 1);
    assert_eq!(ds.n, 2);
    assert_eq!(ds.class_index.n_k(0), 1);
    assert_eq!(ds.class_index.n_k(1), 1);
}

/// spec.md §8 scenario 4: two rows sharing every attribute bit but in
/// different classes must gain a nonzero JNSQ field, and the resulting
/// dataset must satisfy invariant 2 (no two rows share all A' attribute
/// bits while differing in class).
#[test]
fn inconsistent_rows_gain_a_jnsq_bit_and_become_distinguishable() {
    let mut ds = dataset_from_rows(&[(vec![true, false], 0), (vec![true, false], 1)], 2);
    ds.prepare().unwrap();
    let result = apply_jnsq(&mut ds, JnsqOptions::default());
    assert_eq!(result.max_inconsistency, 1);
    assert!(result.jnsq_width > 0);

    for i in 0..ds.n {
        for j in (i + 1)..ds.n {
            if ds.class_of_row(i) != ds.class_of_row(j) {
                assert!(!ds.same_attributes(ds.row(i), ds.row(j)), "rows {} and {} still collide post-JNSQ", i, j);
            }
        }
    }
}

/// A dataset already free of duplicates and inconsistencies must be a
/// no-op for both dedup and JNSQ (spec.md §8 round-trip property).
#[test]
fn clean_dataset_is_a_true_noop_for_dedup_and_jnsq() {
    let mut ds = dataset_from_rows(
        &[(vec![true, false, false], 0), (vec![true, true, false], 0), (vec![false, true, true], 1)],
        2,
    );
    let removed = ds.prepare().unwrap();
    assert_eq!(removed, 0);
    let result = apply_jnsq(&mut ds, JnsqOptions::default());
    assert_eq!(result.max_inconsistency, 0);
    assert_eq!(result.jnsq_width, 0);
}

/// `A` not a multiple of 64: the same-attribute test must mask off the
/// class/JNSQ tail bits of the boundary word rather than comparing them.
#[test]
fn same_attribute_test_ignores_tail_bits_past_a_non_64_aligned_width() {
    let mut rows = vec![false; 70];
    rows[0] = true;
    rows[69] = true;
    let mut other = rows.clone();
    other[69] = false; // differs only in the very last attribute bit

    let ds = dataset_from_rows(&[(rows.clone(), 0), (other.clone(), 1)], 2);
    assert!(!ds.same_attributes(ds.row(0), ds.row(1)));

    let identical = dataset_from_rows(&[(rows.clone(), 0), (rows, 1)], 2);
    assert!(identical.same_attributes(identical.row(0), identical.row(1)));
    // Class bits at the tail of a non-64-aligned row must not leak into
    // the attribute comparison above.
    assert_ne!(identical.class_of_row(0), identical.class_of_row(1));
}

#[test]
fn read_write_field_roundtrip_across_a_word_boundary() {
    let mut words = vec![0u64; 2];
    write_field(&mut words, 61, 6, 0b101101, false);
    assert_eq!(read_field(&words, 61, 6), 0b101101);
}
