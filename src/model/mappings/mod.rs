/// A key to press, and whether shift has to be held while pressing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub key: char,
    pub shifted: bool,
}

// -----------------------------------------------------------------------------
// Hardcoded mapping: MIDI 36 (C2) .. MIDI 96 (C7 inclusive)
//
// White keys walk the number row and then the letter rows in order.
// Black keys reuse the symbol of the white key below them, shifted.
// -----------------------------------------------------------------------------

pub const NOTE_SYMBOLS: &[(u8, char)] = &[
    (36, '1'),
    (37, '!'),
    (38, '2'),
    (39, '@'),
    (40, '3'),
    (41, '4'),
    (42, '$'),
    (43, '5'),
    (44, '%'),
    (45, '6'),
    (46, '^'),
    (47, '7'),
    (48, '8'),
    (49, '*'),
    (50, '9'),
    (51, '('),
    (52, '0'),
    (53, 'q'),
    (54, 'Q'),
    (55, 'w'),
    (56, 'W'),
    (57, 'e'),
    (58, 'E'),
    (59, 'r'),
    (60, 't'),
    (61, 'T'),
    (62, 'y'),
    (63, 'Y'),
    (64, 'u'),
    (65, 'i'),
    (66, 'I'),
    (67, 'o'),
    (68, 'O'),
    (69, 'p'),
    (70, 'P'),
    (71, 'a'),
    (72, 's'),
    (73, 'S'),
    (74, 'd'),
    (75, 'D'),
    (76, 'f'),
    (77, 'g'),
    (78, 'G'),
    (79, 'h'),
    (80, 'H'),
    (81, 'j'),
    (82, 'J'),
    (83, 'k'),
    (84, 'l'),
    (85, 'L'),
    (86, 'z'),
    (87, 'Z'),
    (88, 'x'),
    (89, 'c'),
    (90, 'C'),
    (91, 'v'),
    (92, 'V'),
    (93, 'b'),
    (94, 'B'),
    (95, 'n'),
    (96, 'm'),
];

/// Shifted number-row symbols and the digit key that produces them.
pub const DIGIT_REMAPS: &[(char, char)] = &[
    ('!', '1'),
    ('@', '2'),
    ('£', '3'),
    ('$', '4'),
    ('%', '5'),
    ('^', '6'),
    ('&', '7'),
    ('*', '8'),
    ('(', '9'),
    (')', '0'),
];

/// Punctuation that needs shift on the keyboard layout we target.
pub const SHIFTED_SYMBOLS: &[char] = &[
    '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '_', '+', '{', '}', '|', ':', '"', '<', '>',
    '?', '£', '\\',
];

pub fn symbol_for_midi(midi: u8) -> Option<char> {
    NOTE_SYMBOLS
        .iter()
        .find(|(m, _)| *m == midi)
        .map(|(_, symbol)| *symbol)
}

pub fn is_shifted(symbol: char) -> bool {
    symbol.is_ascii_uppercase() || SHIFTED_SYMBOLS.contains(&symbol)
}

/// Resolves a song symbol to the physical key and shift state that types it.
/// Number-row symbols become their plain digit before the shift test.
pub fn keystroke_for(symbol: char) -> Keystroke {
    let remapped = DIGIT_REMAPS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map_or(symbol, |(_, digit)| *digit);

    Keystroke {
        key: remapped.to_ascii_lowercase(),
        shifted: is_shifted(remapped),
    }
}
