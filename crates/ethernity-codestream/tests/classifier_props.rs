use ethernity_codestream::CodeStream;
use ethernity_core::opcodes::{push_width, PUSH1, PUSH32, STOP};
use proptest::prelude::*;

/// Marca os inícios de instrução percorrendo o código do começo ao fim
fn instruction_starts(code: &[u8]) -> Vec<bool> {
    let mut starts = vec![false; code.len()];
    let mut i = 0;
    while i < code.len() {
        starts[i] = true;
        i += 1 + push_width(code[i]).unwrap_or(0);
    }
    starts
}

fn bytecode() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![PUSH1..=PUSH32, any::<u8>()], 0..160)
}

proptest! {
    #[test]
    fn prop_matches_forward_scan(code in bytecode()) {
        let expected = instruction_starts(&code);
        let mut stream = CodeStream::new(code);
        let got: Vec<bool> = (0..stream.len()).map(|p| stream.is_valid_opcode(p)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_order_independent(code in bytecode(), start in any::<prop::sample::Index>()) {
        let expected = instruction_starts(&code);
        let mut stream = CodeStream::new(code);
        if !expected.is_empty() {
            let first = start.index(expected.len());
            prop_assert_eq!(stream.is_valid_opcode(first), expected[first]);
        }
        for p in (0..stream.len()).rev() {
            prop_assert_eq!(stream.is_valid_opcode(p), expected[p]);
        }
    }

    #[test]
    fn prop_memo_is_idempotent(code in bytecode()) {
        let mut stream = CodeStream::new(code);
        let first: Vec<bool> = (0..stream.len()).map(|p| stream.is_valid_opcode(p)).collect();
        let scans = stream.stats().scans;
        let second: Vec<bool> = (0..stream.len()).map(|p| stream.is_valid_opcode(p)).collect();
        prop_assert_eq!(first, second);
        prop_assert_eq!(stream.stats().scans, scans);
        prop_assert_eq!(scans, stream.len());
    }

    #[test]
    fn prop_out_of_range_is_invalid(code in bytecode(), extra in 0usize..1_000) {
        let mut stream = CodeStream::new(code);
        let position = stream.len() + extra;
        prop_assert!(!stream.is_valid_opcode(position));
    }

    #[test]
    fn prop_peek_matches_next(code in bytecode(), start in 0usize..200) {
        let mut stream = CodeStream::new(code);
        stream.set_position(start);
        let position = stream.position();
        prop_assert!(position <= stream.len());

        let peeked = stream.peek();
        prop_assert_eq!(stream.peek(), peeked);
        prop_assert_eq!(stream.position(), position);

        prop_assert_eq!(stream.next_opcode(), peeked);
        if position == stream.len() {
            prop_assert_eq!(peeked, STOP);
            prop_assert_eq!(stream.position(), position);
        } else {
            prop_assert_eq!(stream.position(), position + 1);
        }
    }
}
