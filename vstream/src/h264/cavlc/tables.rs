//! Tables 9-5 and 9-7 to 9-10

use crate::bitstream::VlcCode;
use crate::h264::cavlc::CoeffToken;

const fn ct(trailing_ones: u8, total_coeff: u8, len: u8, bits: u32) -> VlcCode<CoeffToken> {
    VlcCode::new(
        CoeffToken {
            trailing_ones,
            total_coeff,
        },
        len,
        bits,
    )
}

const fn tz(value: u8, len: u8, bits: u32) -> VlcCode<u8> {
    VlcCode::new(value, len, bits)
}

pub(super) static COEFF_TOKEN_0: [VlcCode<CoeffToken>; 62] = [
    ct(0, 0, 1, 0b1),
    ct(0, 1, 6, 0b000101),
    ct(1, 1, 2, 0b01),
    ct(0, 2, 8, 0b00000111),
    ct(1, 2, 6, 0b000100),
    ct(2, 2, 3, 0b001),
    ct(0, 3, 9, 0b000000111),
    ct(1, 3, 8, 0b00000110),
    ct(2, 3, 7, 0b0000101),
    ct(3, 3, 5, 0b00011),
    ct(0, 4, 10, 0b0000000111),
    ct(1, 4, 9, 0b000000110),
    ct(2, 4, 8, 0b00000101),
    ct(3, 4, 6, 0b000011),
    ct(0, 5, 11, 0b00000000111),
    ct(1, 5, 10, 0b0000000110),
    ct(2, 5, 9, 0b000000101),
    ct(3, 5, 7, 0b0000100),
    ct(0, 6, 13, 0b0000000001111),
    ct(1, 6, 11, 0b00000000110),
    ct(2, 6, 10, 0b0000000101),
    ct(3, 6, 8, 0b00000100),
    ct(0, 7, 13, 0b0000000001011),
    ct(1, 7, 13, 0b0000000001110),
    ct(2, 7, 11, 0b00000000101),
    ct(3, 7, 9, 0b000000100),
    ct(0, 8, 13, 0b0000000001000),
    ct(1, 8, 13, 0b0000000001010),
    ct(2, 8, 13, 0b0000000001101),
    ct(3, 8, 10, 0b0000000100),
    ct(0, 9, 14, 0b00000000001111),
    ct(1, 9, 14, 0b00000000001110),
    ct(2, 9, 13, 0b0000000001001),
    ct(3, 9, 11, 0b00000000100),
    ct(0, 10, 14, 0b00000000001011),
    ct(1, 10, 14, 0b00000000001010),
    ct(2, 10, 14, 0b00000000001101),
    ct(3, 10, 13, 0b0000000001100),
    ct(0, 11, 15, 0b000000000001111),
    ct(1, 11, 15, 0b000000000001110),
    ct(2, 11, 14, 0b00000000001001),
    ct(3, 11, 14, 0b00000000001100),
    ct(0, 12, 15, 0b000000000001011),
    ct(1, 12, 15, 0b000000000001010),
    ct(2, 12, 15, 0b000000000001101),
    ct(3, 12, 14, 0b00000000001000),
    ct(0, 13, 16, 0b0000000000001111),
    ct(1, 13, 15, 0b000000000000001),
    ct(2, 13, 15, 0b000000000001001),
    ct(3, 13, 15, 0b000000000001100),
    ct(0, 14, 16, 0b0000000000001011),
    ct(1, 14, 16, 0b0000000000001110),
    ct(2, 14, 16, 0b0000000000001101),
    ct(3, 14, 15, 0b000000000001000),
    ct(0, 15, 16, 0b0000000000000111),
    ct(1, 15, 16, 0b0000000000001010),
    ct(2, 15, 16, 0b0000000000001001),
    ct(3, 15, 16, 0b0000000000001100),
    ct(0, 16, 16, 0b0000000000000100),
    ct(1, 16, 16, 0b0000000000000110),
    ct(2, 16, 16, 0b0000000000000101),
    ct(3, 16, 16, 0b0000000000001000),
];

pub(super) static COEFF_TOKEN_2: [VlcCode<CoeffToken>; 62] = [
    ct(0, 0, 2, 0b11),
    ct(0, 1, 6, 0b001011),
    ct(1, 1, 2, 0b10),
    ct(0, 2, 6, 0b000111),
    ct(1, 2, 5, 0b00111),
    ct(2, 2, 3, 0b011),
    ct(0, 3, 7, 0b0000111),
    ct(1, 3, 6, 0b001010),
    ct(2, 3, 6, 0b001001),
    ct(3, 3, 4, 0b0101),
    ct(0, 4, 8, 0b00000111),
    ct(1, 4, 6, 0b000110),
    ct(2, 4, 6, 0b000101),
    ct(3, 4, 4, 0b0100),
    ct(0, 5, 8, 0b00000100),
    ct(1, 5, 7, 0b0000110),
    ct(2, 5, 7, 0b0000101),
    ct(3, 5, 5, 0b00110),
    ct(0, 6, 9, 0b000000111),
    ct(1, 6, 8, 0b00000110),
    ct(2, 6, 8, 0b00000101),
    ct(3, 6, 6, 0b001000),
    ct(0, 7, 11, 0b00000001111),
    ct(1, 7, 9, 0b000000110),
    ct(2, 7, 9, 0b000000101),
    ct(3, 7, 6, 0b000100),
    ct(0, 8, 11, 0b00000001011),
    ct(1, 8, 11, 0b00000001110),
    ct(2, 8, 11, 0b00000001101),
    ct(3, 8, 7, 0b0000100),
    ct(0, 9, 12, 0b000000001111),
    ct(1, 9, 11, 0b00000001010),
    ct(2, 9, 11, 0b00000001001),
    ct(3, 9, 9, 0b000000100),
    ct(0, 10, 12, 0b000000001011),
    ct(1, 10, 12, 0b000000001110),
    ct(2, 10, 12, 0b000000001101),
    ct(3, 10, 11, 0b00000001100),
    ct(0, 11, 12, 0b000000001000),
    ct(1, 11, 12, 0b000000001010),
    ct(2, 11, 12, 0b000000001001),
    ct(3, 11, 11, 0b00000001000),
    ct(0, 12, 13, 0b0000000001111),
    ct(1, 12, 13, 0b0000000001110),
    ct(2, 12, 13, 0b0000000001101),
    ct(3, 12, 12, 0b000000001100),
    ct(0, 13, 13, 0b0000000001011),
    ct(1, 13, 13, 0b0000000001010),
    ct(2, 13, 13, 0b0000000001001),
    ct(3, 13, 13, 0b0000000001100),
    ct(0, 14, 13, 0b0000000000111),
    ct(1, 14, 14, 0b00000000001011),
    ct(2, 14, 13, 0b0000000000110),
    ct(3, 14, 13, 0b0000000001000),
    ct(0, 15, 14, 0b00000000001001),
    ct(1, 15, 14, 0b00000000001000),
    ct(2, 15, 14, 0b00000000001010),
    ct(3, 15, 13, 0b0000000000001),
    ct(0, 16, 14, 0b00000000000111),
    ct(1, 16, 14, 0b00000000000110),
    ct(2, 16, 14, 0b00000000000101),
    ct(3, 16, 14, 0b00000000000100),
];

pub(super) static COEFF_TOKEN_4: [VlcCode<CoeffToken>; 62] = [
    ct(0, 0, 4, 0b1111),
    ct(0, 1, 6, 0b001111),
    ct(1, 1, 4, 0b1110),
    ct(0, 2, 6, 0b001011),
    ct(1, 2, 5, 0b01111),
    ct(2, 2, 4, 0b1101),
    ct(0, 3, 6, 0b001000),
    ct(1, 3, 5, 0b01100),
    ct(2, 3, 5, 0b01110),
    ct(3, 3, 4, 0b1100),
    ct(0, 4, 7, 0b0001111),
    ct(1, 4, 5, 0b01010),
    ct(2, 4, 5, 0b01011),
    ct(3, 4, 4, 0b1011),
    ct(0, 5, 7, 0b0001011),
    ct(1, 5, 5, 0b01000),
    ct(2, 5, 5, 0b01001),
    ct(3, 5, 4, 0b1010),
    ct(0, 6, 7, 0b0001001),
    ct(1, 6, 6, 0b001110),
    ct(2, 6, 6, 0b001101),
    ct(3, 6, 4, 0b1001),
    ct(0, 7, 7, 0b0001000),
    ct(1, 7, 6, 0b001010),
    ct(2, 7, 6, 0b001001),
    ct(3, 7, 4, 0b1000),
    ct(0, 8, 8, 0b00001111),
    ct(1, 8, 7, 0b0001110),
    ct(2, 8, 7, 0b0001101),
    ct(3, 8, 5, 0b01101),
    ct(0, 9, 8, 0b00001011),
    ct(1, 9, 8, 0b00001110),
    ct(2, 9, 7, 0b0001010),
    ct(3, 9, 6, 0b001100),
    ct(0, 10, 9, 0b000001111),
    ct(1, 10, 8, 0b00001010),
    ct(2, 10, 8, 0b00001101),
    ct(3, 10, 7, 0b0001100),
    ct(0, 11, 9, 0b000001011),
    ct(1, 11, 9, 0b000001110),
    ct(2, 11, 8, 0b00001001),
    ct(3, 11, 8, 0b00001100),
    ct(0, 12, 9, 0b000001000),
    ct(1, 12, 9, 0b000001010),
    ct(2, 12, 9, 0b000001101),
    ct(3, 12, 8, 0b00001000),
    ct(0, 13, 10, 0b0000001101),
    ct(1, 13, 9, 0b000000111),
    ct(2, 13, 9, 0b000001001),
    ct(3, 13, 9, 0b000001100),
    ct(0, 14, 10, 0b0000001001),
    ct(1, 14, 10, 0b0000001100),
    ct(2, 14, 10, 0b0000001011),
    ct(3, 14, 10, 0b0000001010),
    ct(0, 15, 10, 0b0000000101),
    ct(1, 15, 10, 0b0000001000),
    ct(2, 15, 10, 0b0000000111),
    ct(3, 15, 10, 0b0000000110),
    ct(0, 16, 10, 0b0000000001),
    ct(1, 16, 10, 0b0000000100),
    ct(2, 16, 10, 0b0000000011),
    ct(3, 16, 10, 0b0000000010),
];

pub(super) static COEFF_TOKEN_8: [VlcCode<CoeffToken>; 62] = [
    ct(0, 0, 6, 0b000011),
    ct(0, 1, 6, 0b000000),
    ct(1, 1, 6, 0b000001),
    ct(0, 2, 6, 0b000100),
    ct(1, 2, 6, 0b000101),
    ct(2, 2, 6, 0b000110),
    ct(0, 3, 6, 0b001000),
    ct(1, 3, 6, 0b001001),
    ct(2, 3, 6, 0b001010),
    ct(3, 3, 6, 0b001011),
    ct(0, 4, 6, 0b001100),
    ct(1, 4, 6, 0b001101),
    ct(2, 4, 6, 0b001110),
    ct(3, 4, 6, 0b001111),
    ct(0, 5, 6, 0b010000),
    ct(1, 5, 6, 0b010001),
    ct(2, 5, 6, 0b010010),
    ct(3, 5, 6, 0b010011),
    ct(0, 6, 6, 0b010100),
    ct(1, 6, 6, 0b010101),
    ct(2, 6, 6, 0b010110),
    ct(3, 6, 6, 0b010111),
    ct(0, 7, 6, 0b011000),
    ct(1, 7, 6, 0b011001),
    ct(2, 7, 6, 0b011010),
    ct(3, 7, 6, 0b011011),
    ct(0, 8, 6, 0b011100),
    ct(1, 8, 6, 0b011101),
    ct(2, 8, 6, 0b011110),
    ct(3, 8, 6, 0b011111),
    ct(0, 9, 6, 0b100000),
    ct(1, 9, 6, 0b100001),
    ct(2, 9, 6, 0b100010),
    ct(3, 9, 6, 0b100011),
    ct(0, 10, 6, 0b100100),
    ct(1, 10, 6, 0b100101),
    ct(2, 10, 6, 0b100110),
    ct(3, 10, 6, 0b100111),
    ct(0, 11, 6, 0b101000),
    ct(1, 11, 6, 0b101001),
    ct(2, 11, 6, 0b101010),
    ct(3, 11, 6, 0b101011),
    ct(0, 12, 6, 0b101100),
    ct(1, 12, 6, 0b101101),
    ct(2, 12, 6, 0b101110),
    ct(3, 12, 6, 0b101111),
    ct(0, 13, 6, 0b110000),
    ct(1, 13, 6, 0b110001),
    ct(2, 13, 6, 0b110010),
    ct(3, 13, 6, 0b110011),
    ct(0, 14, 6, 0b110100),
    ct(1, 14, 6, 0b110101),
    ct(2, 14, 6, 0b110110),
    ct(3, 14, 6, 0b110111),
    ct(0, 15, 6, 0b111000),
    ct(1, 15, 6, 0b111001),
    ct(2, 15, 6, 0b111010),
    ct(3, 15, 6, 0b111011),
    ct(0, 16, 6, 0b111100),
    ct(1, 16, 6, 0b111101),
    ct(2, 16, 6, 0b111110),
    ct(3, 16, 6, 0b111111),
];

pub(super) static COEFF_TOKEN_NEG1: [VlcCode<CoeffToken>; 14] = [
    ct(0, 0, 2, 0b01),
    ct(0, 1, 6, 0b000111),
    ct(1, 1, 1, 0b1),
    ct(0, 2, 6, 0b000100),
    ct(1, 2, 6, 0b000110),
    ct(2, 2, 3, 0b001),
    ct(0, 3, 6, 0b000011),
    ct(1, 3, 7, 0b0000011),
    ct(2, 3, 7, 0b0000010),
    ct(3, 3, 6, 0b000101),
    ct(0, 4, 6, 0b000010),
    ct(1, 4, 8, 0b00000011),
    ct(2, 4, 8, 0b00000010),
    ct(3, 4, 7, 0b0000000),
];

pub(super) static COEFF_TOKEN_NEG2: [VlcCode<CoeffToken>; 30] = [
    ct(0, 0, 1, 0b1),
    ct(0, 1, 7, 0b0001111),
    ct(1, 1, 2, 0b01),
    ct(0, 2, 7, 0b0001110),
    ct(1, 2, 7, 0b0001101),
    ct(2, 2, 3, 0b001),
    ct(0, 3, 9, 0b000000111),
    ct(1, 3, 7, 0b0001100),
    ct(2, 3, 7, 0b0001011),
    ct(3, 3, 5, 0b00001),
    ct(0, 4, 9, 0b000000110),
    ct(1, 4, 9, 0b000000101),
    ct(2, 4, 7, 0b0001010),
    ct(3, 4, 6, 0b000001),
    ct(0, 5, 10, 0b0000000111),
    ct(1, 5, 10, 0b0000000110),
    ct(2, 5, 9, 0b000000100),
    ct(3, 5, 7, 0b0001001),
    ct(0, 6, 11, 0b00000000111),
    ct(1, 6, 11, 0b00000000110),
    ct(2, 6, 10, 0b0000000101),
    ct(3, 6, 7, 0b0001000),
    ct(0, 7, 12, 0b000000000111),
    ct(1, 7, 12, 0b000000000110),
    ct(2, 7, 11, 0b00000000101),
    ct(3, 7, 10, 0b0000000100),
    ct(0, 8, 13, 0b0000000000111),
    ct(1, 8, 12, 0b000000000101),
    ct(2, 8, 12, 0b000000000100),
    ct(3, 8, 11, 0b00000000100),
];

pub(super) static TOTAL_ZEROS_1: [VlcCode<u8>; 16] = [
    tz(0, 1, 0b1),
    tz(1, 3, 0b011),
    tz(2, 3, 0b010),
    tz(3, 4, 0b0011),
    tz(4, 4, 0b0010),
    tz(5, 5, 0b00011),
    tz(6, 5, 0b00010),
    tz(7, 6, 0b000011),
    tz(8, 6, 0b000010),
    tz(9, 7, 0b0000011),
    tz(10, 7, 0b0000010),
    tz(11, 8, 0b00000011),
    tz(12, 8, 0b00000010),
    tz(13, 9, 0b000000011),
    tz(14, 9, 0b000000010),
    tz(15, 9, 0b000000001),
];

pub(super) static TOTAL_ZEROS_2: [VlcCode<u8>; 15] = [
    tz(0, 3, 0b111),
    tz(1, 3, 0b110),
    tz(2, 3, 0b101),
    tz(3, 3, 0b100),
    tz(4, 3, 0b011),
    tz(5, 4, 0b0101),
    tz(6, 4, 0b0100),
    tz(7, 4, 0b0011),
    tz(8, 4, 0b0010),
    tz(9, 5, 0b00011),
    tz(10, 5, 0b00010),
    tz(11, 6, 0b000011),
    tz(12, 6, 0b000010),
    tz(13, 6, 0b000001),
    tz(14, 6, 0b000000),
];

pub(super) static TOTAL_ZEROS_3: [VlcCode<u8>; 14] = [
    tz(0, 4, 0b0101),
    tz(1, 3, 0b111),
    tz(2, 3, 0b110),
    tz(3, 3, 0b101),
    tz(4, 4, 0b0100),
    tz(5, 4, 0b0011),
    tz(6, 3, 0b100),
    tz(7, 3, 0b011),
    tz(8, 4, 0b0010),
    tz(9, 5, 0b00011),
    tz(10, 5, 0b00010),
    tz(11, 6, 0b000001),
    tz(12, 5, 0b00001),
    tz(13, 6, 0b000000),
];

pub(super) static TOTAL_ZEROS_4: [VlcCode<u8>; 13] = [
    tz(0, 5, 0b00011),
    tz(1, 3, 0b111),
    tz(2, 4, 0b0101),
    tz(3, 4, 0b0100),
    tz(4, 3, 0b110),
    tz(5, 3, 0b101),
    tz(6, 3, 0b100),
    tz(7, 4, 0b0011),
    tz(8, 3, 0b011),
    tz(9, 4, 0b0010),
    tz(10, 5, 0b00010),
    tz(11, 5, 0b00001),
    tz(12, 5, 0b00000),
];

pub(super) static TOTAL_ZEROS_5: [VlcCode<u8>; 12] = [
    tz(0, 4, 0b0101),
    tz(1, 4, 0b0100),
    tz(2, 4, 0b0011),
    tz(3, 3, 0b111),
    tz(4, 3, 0b110),
    tz(5, 3, 0b101),
    tz(6, 3, 0b100),
    tz(7, 3, 0b011),
    tz(8, 4, 0b0010),
    tz(9, 5, 0b00001),
    tz(10, 4, 0b0001),
    tz(11, 5, 0b00000),
];

pub(super) static TOTAL_ZEROS_6: [VlcCode<u8>; 11] = [
    tz(0, 6, 0b000001),
    tz(1, 5, 0b00001),
    tz(2, 3, 0b111),
    tz(3, 3, 0b110),
    tz(4, 3, 0b101),
    tz(5, 3, 0b100),
    tz(6, 3, 0b011),
    tz(7, 3, 0b010),
    tz(8, 4, 0b0001),
    tz(9, 3, 0b001),
    tz(10, 6, 0b000000),
];

pub(super) static TOTAL_ZEROS_7: [VlcCode<u8>; 10] = [
    tz(0, 6, 0b000001),
    tz(1, 5, 0b00001),
    tz(2, 3, 0b101),
    tz(3, 3, 0b100),
    tz(4, 3, 0b011),
    tz(5, 2, 0b11),
    tz(6, 3, 0b010),
    tz(7, 4, 0b0001),
    tz(8, 3, 0b001),
    tz(9, 6, 0b000000),
];

pub(super) static TOTAL_ZEROS_8: [VlcCode<u8>; 9] = [
    tz(0, 6, 0b000001),
    tz(1, 4, 0b0001),
    tz(2, 5, 0b00001),
    tz(3, 3, 0b011),
    tz(4, 2, 0b11),
    tz(5, 2, 0b10),
    tz(6, 3, 0b010),
    tz(7, 3, 0b001),
    tz(8, 6, 0b000000),
];

pub(super) static TOTAL_ZEROS_9: [VlcCode<u8>; 8] = [
    tz(0, 6, 0b000001),
    tz(1, 6, 0b000000),
    tz(2, 4, 0b0001),
    tz(3, 2, 0b11),
    tz(4, 2, 0b10),
    tz(5, 3, 0b001),
    tz(6, 2, 0b01),
    tz(7, 5, 0b00001),
];

pub(super) static TOTAL_ZEROS_10: [VlcCode<u8>; 7] = [
    tz(0, 5, 0b00001),
    tz(1, 5, 0b00000),
    tz(2, 3, 0b001),
    tz(3, 2, 0b11),
    tz(4, 2, 0b10),
    tz(5, 2, 0b01),
    tz(6, 4, 0b0001),
];

pub(super) static TOTAL_ZEROS_11: [VlcCode<u8>; 6] = [
    tz(0, 4, 0b0000),
    tz(1, 4, 0b0001),
    tz(2, 3, 0b001),
    tz(3, 3, 0b010),
    tz(4, 1, 0b1),
    tz(5, 3, 0b011),
];

pub(super) static TOTAL_ZEROS_12: [VlcCode<u8>; 5] = [
    tz(0, 4, 0b0000),
    tz(1, 4, 0b0001),
    tz(2, 2, 0b01),
    tz(3, 1, 0b1),
    tz(4, 3, 0b001),
];

pub(super) static TOTAL_ZEROS_13: [VlcCode<u8>; 4] = [
    tz(0, 3, 0b000),
    tz(1, 3, 0b001),
    tz(2, 1, 0b1),
    tz(3, 2, 0b01),
];

pub(super) static TOTAL_ZEROS_14: [VlcCode<u8>; 3] = [
    tz(0, 2, 0b00),
    tz(1, 2, 0b01),
    tz(2, 1, 0b1),
];

pub(super) static TOTAL_ZEROS_15: [VlcCode<u8>; 2] = [
    tz(0, 1, 0b0),
    tz(1, 1, 0b1),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_420_1: [VlcCode<u8>; 4] = [
    tz(0, 1, 0b1),
    tz(1, 2, 0b01),
    tz(2, 3, 0b001),
    tz(3, 3, 0b000),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_420_2: [VlcCode<u8>; 3] = [
    tz(0, 1, 0b1),
    tz(1, 2, 0b01),
    tz(2, 2, 0b00),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_420_3: [VlcCode<u8>; 2] = [
    tz(0, 1, 0b1),
    tz(1, 1, 0b0),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_422_1: [VlcCode<u8>; 8] = [
    tz(0, 1, 0b1),
    tz(1, 3, 0b010),
    tz(2, 3, 0b011),
    tz(3, 4, 0b0010),
    tz(4, 4, 0b0011),
    tz(5, 4, 0b0001),
    tz(6, 5, 0b00001),
    tz(7, 5, 0b00000),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_422_2: [VlcCode<u8>; 7] = [
    tz(0, 3, 0b000),
    tz(1, 2, 0b01),
    tz(2, 3, 0b001),
    tz(3, 3, 0b100),
    tz(4, 3, 0b101),
    tz(5, 3, 0b110),
    tz(6, 3, 0b111),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_422_3: [VlcCode<u8>; 6] = [
    tz(0, 3, 0b000),
    tz(1, 3, 0b001),
    tz(2, 2, 0b01),
    tz(3, 2, 0b10),
    tz(4, 3, 0b110),
    tz(5, 3, 0b111),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_422_4: [VlcCode<u8>; 5] = [
    tz(0, 3, 0b110),
    tz(1, 2, 0b00),
    tz(2, 2, 0b01),
    tz(3, 2, 0b10),
    tz(4, 3, 0b111),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_422_5: [VlcCode<u8>; 4] = [
    tz(0, 2, 0b00),
    tz(1, 2, 0b01),
    tz(2, 2, 0b10),
    tz(3, 2, 0b11),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_422_6: [VlcCode<u8>; 3] = [
    tz(0, 2, 0b00),
    tz(1, 2, 0b01),
    tz(2, 1, 0b1),
];

pub(super) static TOTAL_ZEROS_CHROMA_DC_422_7: [VlcCode<u8>; 2] = [
    tz(0, 1, 0b0),
    tz(1, 1, 0b1),
];

pub(super) static RUN_BEFORE_1: [VlcCode<u8>; 2] = [
    tz(0, 1, 0b1),
    tz(1, 1, 0b0),
];

pub(super) static RUN_BEFORE_2: [VlcCode<u8>; 3] = [
    tz(0, 1, 0b1),
    tz(1, 2, 0b01),
    tz(2, 2, 0b00),
];

pub(super) static RUN_BEFORE_3: [VlcCode<u8>; 4] = [
    tz(0, 2, 0b11),
    tz(1, 2, 0b10),
    tz(2, 2, 0b01),
    tz(3, 2, 0b00),
];

pub(super) static RUN_BEFORE_4: [VlcCode<u8>; 5] = [
    tz(0, 2, 0b11),
    tz(1, 2, 0b10),
    tz(2, 2, 0b01),
    tz(3, 3, 0b001),
    tz(4, 3, 0b000),
];

pub(super) static RUN_BEFORE_5: [VlcCode<u8>; 6] = [
    tz(0, 2, 0b11),
    tz(1, 2, 0b10),
    tz(2, 3, 0b011),
    tz(3, 3, 0b010),
    tz(4, 3, 0b001),
    tz(5, 3, 0b000),
];

pub(super) static RUN_BEFORE_6: [VlcCode<u8>; 7] = [
    tz(0, 2, 0b11),
    tz(1, 3, 0b000),
    tz(2, 3, 0b001),
    tz(3, 3, 0b011),
    tz(4, 3, 0b010),
    tz(5, 3, 0b101),
    tz(6, 3, 0b100),
];

pub(super) static RUN_BEFORE_X: [VlcCode<u8>; 15] = [
    tz(0, 3, 0b111),
    tz(1, 3, 0b110),
    tz(2, 3, 0b101),
    tz(3, 3, 0b100),
    tz(4, 3, 0b011),
    tz(5, 3, 0b010),
    tz(6, 3, 0b001),
    tz(7, 4, 0b0001),
    tz(8, 5, 0b00001),
    tz(9, 6, 0b000001),
    tz(10, 7, 0b0000001),
    tz(11, 8, 0b00000001),
    tz(12, 9, 0b000000001),
    tz(13, 10, 0b0000000001),
    tz(14, 11, 0b00000000001),
];
