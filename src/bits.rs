// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Word-level bit utilities shared by every module that addresses a bit
//! position within a row of 64-bit words. Rows are stored most-significant
//! bit first within each word; this module is the single place that
//! convention is encoded, so every other module addresses bits through it
//! rather than re-deriving the `(word, bit)` split.

/// Number of bits packed into one storage word.
pub const WORD_BITS: usize = 64;

/// Splits a bit index `j` (0-based, MSB-first within its word) into its
/// `(word, bit)` coordinates, where `bit` is the shift amount from the
/// least-significant side of the word.
///
/// ```
/// # use laid_cover::bits::word_and_bit;
/// assert_eq!(word_and_bit(0), (0, 63));
/// assert_eq!(word_and_bit(63), (0, 0));
/// assert_eq!(word_and_bit(64), (1, 63));
/// ```
#[inline]
pub fn word_and_bit(j: usize) -> (usize, usize) {
    (j / WORD_BITS, WORD_BITS - 1 - (j % WORD_BITS))
}

/// Returns `true` iff bit `j` is set in `words`.
#[inline]
pub fn get_bit(words: &[u64], j: usize) -> bool {
    let (w, b) = word_and_bit(j);
    (words[w] >> b) & 1 == 1
}

/// Sets bit `j` of `words` to `value`.
#[inline]
pub fn set_bit(words: &mut [u64], j: usize, value: bool) {
    let (w, b) = word_and_bit(j);
    if value {
        words[w] |= 1u64 << b;
    } else {
        words[w] &= !(1u64 << b);
    }
}

/// Builds a mask with the leading (most-significant) `bits` bits set and
/// all others clear. `leading_mask(0) == 0`, `leading_mask(64) == !0`.
///
/// Used by the same-attribute test to mask off the class/JNSQ tail that
/// shares a word with the last few attribute bits.
#[inline]
pub fn leading_mask(bits: usize) -> u64 {
    if bits == 0 {
        0
    } else if bits >= WORD_BITS {
        !0u64
    } else {
        !0u64 << (WORD_BITS - bits)
    }
}

/// Number of whole words needed to hold `bits` bits.
#[inline]
pub fn words_for_bits(bits: usize) -> usize {
    (bits + WORD_BITS - 1) / WORD_BITS
}

/// Popcount of a single word, named for symmetry with the rest of this
/// module rather than calling `u64::count_ones` directly at every site.
#[inline]
pub fn popcount_word(w: u64) -> u32 {
    w.count_ones()
}

/// Number of bits needed to represent `values` distinct values (i.e.
/// `ceil(log2(values))`), used both to size the class field from the
/// class count and to size the JNSQ field from `1 + max_inconsistency`.
/// `bits_to_represent(0) == bits_to_represent(1) == 0`.
///
/// ```
/// # use laid_cover::bits::bits_to_represent;
/// assert_eq!(bits_to_represent(1), 0);
/// assert_eq!(bits_to_represent(2), 1);
/// assert_eq!(bits_to_represent(3), 2);
/// assert_eq!(bits_to_represent(4), 2);
/// assert_eq!(bits_to_represent(5), 3);
/// ```
#[inline]
pub fn bits_to_represent(values: u64) -> usize {
    if values <= 1 {
        0
    } else {
        (WORD_BITS as u32 - (values - 1).leading_zeros()) as usize
    }
}

/// Transposes a 64x64 bit matrix in place, using natural (least-significant-
/// bit-first) addressing: after the call, bit `j` of `block[i]` holds what
/// was originally bit `i` of `block[j]`, for every `i, j` in `0..64`. This
/// is unrelated to this module's row-level MSB-first convention — it is a
/// generic matrix operation over a flat array of 64 words.
///
/// The classic divide-and-conquer transpose (Warren, *Hacker's Delight*,
/// section 7-3).
pub fn transpose_block(block: &mut [u64; WORD_BITS]) {
    let mut j = 32usize;
    let mut m: u64 = 0x0000_0000_FFFF_FFFF;
    while j != 0 {
        let mut k = 0usize;
        while k < WORD_BITS {
            let t = (block[k] ^ (block[k + j] >> j)) & m;
            block[k] ^= t;
            block[k + j] ^= t << j;
            k = (k + j + 1) & !j;
        }
        j >>= 1;
        m ^= m << j;
    }
}

/// Turns 64 consecutive rows' discrimination words for one word-index into
/// 64 per-attribute column words covering those same rows, via
/// `transpose_block`. `rows[i]` is the XOR word (row-level MSB-first
/// convention: attribute `k`'s bit sits at shift `63 - k`) for the row at
/// offset `i` within the block; the result's entry `k` is a column word in
/// the same MSB-first convention, with the row at offset `i` at shift
/// `63 - i`.
///
/// Both this module's row/attribute addressing and the rows-to-columns
/// offset both run MSB-first, which is the bit-reversal of
/// `transpose_block`'s natural addressing in both directions — so the
/// rows are fed to `transpose_block` and its result read back in reversed
/// array order, which is exactly the double bit-reversal needed to cancel
/// out and land the transposed words back in the convention this crate's
/// row/column buffers already use.
///
/// ```
/// # use laid_cover::bits::transpose_rows_to_columns;
/// let mut rows = [0u64; 64];
/// rows[1] = 1u64 << 61; // row 1, attribute 2 (shift 63-2=61)
/// let columns = transpose_rows_to_columns(&rows);
/// assert_eq!(columns[2], 1u64 << 62); // attribute 2, row 1 (shift 63-1=62)
/// assert!(columns.iter().enumerate().all(|(k, &c)| k == 2 || c == 0));
/// ```
pub fn transpose_rows_to_columns(rows: &[u64; WORD_BITS]) -> [u64; WORD_BITS] {
    let mut block = *rows;
    block.reverse();
    transpose_block(&mut block);
    block.reverse();
    block
}

/// Reverses the low `width` bits of `value`, leaving higher bits zero.
/// Used by the JNSQ stage to encode the inconsistency counter in
/// bit-reversed order when the field is wider than one bit.
///
/// ```
/// # use laid_cover::bits::reverse_bits;
/// assert_eq!(reverse_bits(0b001, 3), 0b100);
/// assert_eq!(reverse_bits(0b101, 3), 0b101);
/// assert_eq!(reverse_bits(0b10, 2), 0b01);
/// ```
#[inline]
pub fn reverse_bits(value: u64, width: usize) -> u64 {
    let mut v = value;
    let mut r = 0u64;
    for _ in 0..width {
        r = (r << 1) | (v & 1);
        v >>= 1;
    }
    r
}
