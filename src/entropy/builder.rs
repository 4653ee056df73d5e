//! Length limited Huffman table construction from symbol frequencies.
//!
//! Code sizes come from repeatedly merging the two least frequent symbols
//! while chaining every symbol that went through a merge, the procedure of
//! JPEG Annex K.2. The last entry of the frequency vector is a reserved
//! symbol with a count of one. It always ends up with the longest code and
//! is removed from the final counts, so no transmitted code is all ones.
//! Unlike NBIS, which leaves the reserved symbol out of the histogram and
//! only gives up a code while limiting, this counts it first; the two agree
//! whenever no length exceeds 16.
use crate::entropy::{CodeLengthSpec, MAX_CODE_LENGTH};
use crate::error::{Error, Result};

/// Lengths are histogrammed this deep before limiting.
const MAX_UNLIMITED_LENGTH: usize = 32;

/// Builds the code length spec for `frequencies`, whose last entry is the
/// reserved symbol. Every other index is a symbol value and must fit a byte.
pub fn build_table(frequencies: &[u32]) -> Result<CodeLengthSpec> {
    if frequencies.len() < 2 || frequencies.len() > 257 {
        return Err(Error::InvalidHuffmanTable {
            table_id: 0,
            reason: "alphabet must hold 1 to 256 symbols plus the reserved one",
        });
    }
    let code_sizes = code_sizes(frequencies);
    let mut counts = count_code_sizes(&code_sizes)?;
    limit_code_lengths(&mut counts)?;

    let mut bits = [0u8; MAX_CODE_LENGTH];
    for (bit, &count) in bits.iter_mut().zip(counts.iter()) {
        *bit = u8::try_from(count).map_err(|_| Error::CodeLengthOverflow)?;
    }
    let values = sort_code_sizes(&code_sizes);
    log::debug!(
        "built Huffman table with {} codes, longest {}",
        values.len(),
        bits.iter().rposition(|&b| b > 0).map_or(0, |i| i + 1)
    );
    Ok(CodeLengthSpec { bits, values })
}

/// Code size of every symbol, zero for symbols that never occur.
pub fn code_sizes(frequencies: &[u32]) -> Vec<u32> {
    let mut freq: Vec<u64> = frequencies.iter().map(|&f| u64::from(f)).collect();
    let mut sizes = vec![0u32; freq.len()];
    let mut others: Vec<Option<usize>> = vec![None; freq.len()];

    while let (Some(first), Some(second)) = least_frequent(&freq) {
        freq[first] += freq[second];
        freq[second] = 0;

        sizes[first] += 1;
        let mut node = first;
        while let Some(next) = others[node] {
            node = next;
            sizes[node] += 1;
        }
        others[node] = Some(second);

        sizes[second] += 1;
        let mut node = second;
        while let Some(next) = others[node] {
            node = next;
            sizes[node] += 1;
        }
    }
    sizes
}

/// Picks the two lowest non-zero frequencies. Equal frequencies prefer the
/// larger index as the first pick.
fn least_frequent(freq: &[u64]) -> (Option<usize>, Option<usize>) {
    let mut first: Option<(usize, u64)> = None;
    let mut second: Option<(usize, u64)> = None;

    for (index, &count) in freq.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let Some((first_index, first_count)) = first else {
            first = Some((index, count));
            continue;
        };
        if second.is_none() {
            second = Some((index, count));
        }
        let (second_index, second_count) = second.unwrap_or((index, count));

        if first_count < count && second_count < count {
            continue;
        }
        if count < first_count || (count == first_count && index > first_index) {
            second = first;
            first = Some((index, count));
        } else if count < second_count || (count == second_count && index > second_index) {
            second = Some((index, count));
        }
    }
    (first.map(|(i, _)| i), second.map(|(i, _)| i))
}

/// Histogram of code sizes, bucket `n` holding the codes of length `n + 1`.
fn count_code_sizes(code_sizes: &[u32]) -> Result<[i32; MAX_UNLIMITED_LENGTH]> {
    let mut counts = [0i32; MAX_UNLIMITED_LENGTH];
    for &size in code_sizes.iter().filter(|&&s| s > 0) {
        let bucket = counts
            .get_mut(size as usize - 1)
            .ok_or(Error::CodeLengthOverflow)?;
        *bucket += 1;
    }
    Ok(counts)
}

/// Moves codes longer than 16 bits up the tree, then gives up the slot of
/// the reserved symbol.
fn limit_code_lengths(counts: &mut [i32; MAX_UNLIMITED_LENGTH]) -> Result<()> {
    for i in (MAX_CODE_LENGTH..MAX_UNLIMITED_LENGTH).rev() {
        while counts[i] > 0 {
            let mut j = i - 2;
            while counts[j] == 0 {
                j = j.checked_sub(1).ok_or(Error::CodeLengthOverflow)?;
            }
            counts[i] -= 2;
            counts[i - 1] += 1;
            counts[j + 1] += 2;
            counts[j] -= 1;
        }
        counts[i] = 0;
    }

    if let Some(longest) = counts[..MAX_CODE_LENGTH].iter().rposition(|&c| c > 0) {
        counts[longest] -= 1;
    }

    if counts[..MAX_CODE_LENGTH].iter().any(|&c| c < 0) {
        return Err(Error::CodeLengthOverflow);
    }
    Ok(())
}

/// Symbols ordered by their unlimited code size, then by value. The
/// reserved symbol is left out.
fn sort_code_sizes(code_sizes: &[u32]) -> Vec<u8> {
    let symbols = &code_sizes[..code_sizes.len() - 1];
    let mut values = Vec::new();
    for length in 1..=MAX_UNLIMITED_LENGTH as u32 {
        values.extend(
            symbols
                .iter()
                .enumerate()
                .filter(|&(_, &size)| size == length)
                .map(|(symbol, _)| symbol as u8),
        );
    }
    values
}
