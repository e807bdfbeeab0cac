/// A single interpreter revision's opcode table.
///
/// `entries` maps the raw byte found in `co_code` to the normalized opcode
/// name for this revision specifically; two revisions may map the same byte
/// to different names, or the same name to different bytes.
pub struct Revision {
    pub magic: u32,
    pub version: &'static str,
    pub has_kwonlyargcount: bool,
    /// Whether two zero-valued padding bytes follow `magic`+`timestamp`
    /// before the first marshalled value. None of the revisions this crate
    /// currently decodes use this padding (it was only ever needed for a
    /// handful of pyc header variants this table doesn't carry), but the
    /// field exists so a future revision that does need it only has to set
    /// it to `true` rather than touch the header-reading code.
    pub has_timestamp_padding: bool,
    entries: &'static [(u8, &'static str)],
}

impl Revision {
    fn name_for(&self, byte: u8) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(b, _)| *b == byte)
            .map(|(_, name)| *name)
    }
}

/// Python 2.6-era opcodes. `LIST_APPEND` has no argument here; it gained one
/// in 2.7, which is why the normalized name differs across revisions (see
/// [`opcode_names`] / the `_ARG` suffix rule documented on the module).
const PY26_ENTRIES: &[(u8, &str)] = &[
    (1, "POP_TOP"),
    (2, "ROT_TWO"),
    (3, "ROT_THREE"),
    (4, "DUP_TOP"),
    (5, "ROT_FOUR"),
    (9, "NOP"),
    (10, "UNARY_POSITIVE"),
    (11, "UNARY_NEGATIVE"),
    (12, "UNARY_NOT"),
    (13, "UNARY_CONVERT"),
    (15, "UNARY_INVERT"),
    (18, "LIST_APPEND"),
    (19, "BINARY_POWER"),
    (20, "BINARY_MULTIPLY"),
    (21, "BINARY_DIVIDE"),
    (22, "BINARY_MODULO"),
    (23, "BINARY_ADD"),
    (24, "BINARY_SUBTRACT"),
    (25, "BINARY_SUBSCR"),
    (26, "BINARY_FLOOR_DIVIDE"),
    (27, "BINARY_TRUE_DIVIDE"),
    (28, "INPLACE_FLOOR_DIVIDE"),
    (29, "INPLACE_TRUE_DIVIDE"),
    (30, "SLICE_0"),
    (31, "SLICE_1"),
    (32, "SLICE_2"),
    (33, "SLICE_3"),
    (40, "STORE_SLICE_0"),
    (41, "STORE_SLICE_1"),
    (42, "STORE_SLICE_2"),
    (43, "STORE_SLICE_3"),
    (50, "DELETE_SLICE_0"),
    (51, "DELETE_SLICE_1"),
    (52, "DELETE_SLICE_2"),
    (53, "DELETE_SLICE_3"),
    (54, "STORE_MAP"),
    (55, "INPLACE_ADD"),
    (56, "INPLACE_SUBTRACT"),
    (57, "INPLACE_MULTIPLY"),
    (58, "INPLACE_DIVIDE"),
    (59, "INPLACE_MODULO"),
    (60, "STORE_SUBSCR"),
    (61, "DELETE_SUBSCR"),
    (62, "BINARY_LSHIFT"),
    (63, "BINARY_RSHIFT"),
    (64, "BINARY_AND"),
    (65, "BINARY_XOR"),
    (66, "BINARY_OR"),
    (67, "INPLACE_POWER"),
    (68, "GET_ITER"),
    (70, "PRINT_EXPR"),
    (71, "PRINT_ITEM"),
    (72, "PRINT_NEWLINE"),
    (73, "PRINT_ITEM_TO"),
    (74, "PRINT_NEWLINE_TO"),
    (75, "INPLACE_LSHIFT"),
    (76, "INPLACE_RSHIFT"),
    (77, "INPLACE_AND"),
    (78, "INPLACE_XOR"),
    (79, "INPLACE_OR"),
    (80, "BREAK_LOOP"),
    (81, "WITH_CLEANUP"),
    (83, "RETURN_VALUE"),
    (84, "IMPORT_STAR"),
    (85, "EXEC_STMT"),
    (86, "YIELD_VALUE"),
    (87, "POP_BLOCK"),
    (88, "END_FINALLY"),
    (89, "BUILD_CLASS"),
    (91, "STORE_NAME"),
    (92, "DELETE_NAME"),
    (93, "UNPACK_SEQUENCE"),
    (94, "FOR_ITER"),
    (96, "STORE_ATTR"),
    (97, "DELETE_ATTR"),
    (98, "STORE_GLOBAL"),
    (99, "DELETE_GLOBAL"),
    (100, "DUP_TOPX"),
    (101, "LOAD_CONST"),
    (102, "LOAD_NAME"),
    (103, "BUILD_TUPLE"),
    (104, "BUILD_LIST"),
    (106, "BUILD_MAP"),
    (107, "LOAD_ATTR"),
    (108, "COMPARE_OP"),
    (109, "IMPORT_NAME"),
    (110, "IMPORT_FROM"),
    (111, "JUMP_FORWARD"),
    (112, "JUMP_IF_FALSE"),
    (113, "JUMP_IF_TRUE"),
    (114, "JUMP_ABSOLUTE"),
    (117, "LOAD_GLOBAL"),
    (119, "CONTINUE_LOOP"),
    (120, "SETUP_LOOP"),
    (121, "SETUP_EXCEPT"),
    (122, "SETUP_FINALLY"),
    (124, "LOAD_FAST"),
    (125, "STORE_FAST"),
    (126, "DELETE_FAST"),
    (130, "RAISE_VARARGS"),
    (131, "CALL_FUNCTION"),
    (132, "MAKE_FUNCTION"),
    (133, "BUILD_SLICE"),
    (134, "MAKE_CLOSURE"),
    (135, "LOAD_CLOSURE"),
    (136, "LOAD_DEREF"),
    (137, "STORE_DEREF"),
    (140, "CALL_FUNCTION_VAR"),
    (141, "CALL_FUNCTION_KW"),
    (142, "CALL_FUNCTION_VAR_KW"),
    (143, "EXTENDED_ARG"),
];

/// Python 2.7. `LIST_APPEND` now takes an argument (the stack distance to
/// the target list) so it is renamed `LIST_APPEND_ARG`; `JUMP_IF_TRUE` /
/// `JUMP_IF_FALSE` were replaced by the `*_OR_POP` and `POP_JUMP_IF_*`
/// family, and `SET_ADD` / `MAP_ADD` were added for set and dict
/// comprehensions.
const PY27_ENTRIES: &[(u8, &str)] = &[
    (1, "POP_TOP"),
    (2, "ROT_TWO"),
    (3, "ROT_THREE"),
    (4, "DUP_TOP"),
    (5, "ROT_FOUR"),
    (9, "NOP"),
    (10, "UNARY_POSITIVE"),
    (11, "UNARY_NEGATIVE"),
    (12, "UNARY_NOT"),
    (13, "UNARY_CONVERT"),
    (15, "UNARY_INVERT"),
    (19, "BINARY_POWER"),
    (20, "BINARY_MULTIPLY"),
    (21, "BINARY_DIVIDE"),
    (22, "BINARY_MODULO"),
    (23, "BINARY_ADD"),
    (24, "BINARY_SUBTRACT"),
    (25, "BINARY_SUBSCR"),
    (26, "BINARY_FLOOR_DIVIDE"),
    (27, "BINARY_TRUE_DIVIDE"),
    (28, "INPLACE_FLOOR_DIVIDE"),
    (29, "INPLACE_TRUE_DIVIDE"),
    (30, "SLICE_0"),
    (31, "SLICE_1"),
    (32, "SLICE_2"),
    (33, "SLICE_3"),
    (40, "STORE_SLICE_0"),
    (41, "STORE_SLICE_1"),
    (42, "STORE_SLICE_2"),
    (43, "STORE_SLICE_3"),
    (50, "DELETE_SLICE_0"),
    (51, "DELETE_SLICE_1"),
    (52, "DELETE_SLICE_2"),
    (53, "DELETE_SLICE_3"),
    (54, "STORE_MAP"),
    (55, "INPLACE_ADD"),
    (56, "INPLACE_SUBTRACT"),
    (57, "INPLACE_MULTIPLY"),
    (58, "INPLACE_DIVIDE"),
    (59, "INPLACE_MODULO"),
    (60, "STORE_SUBSCR"),
    (61, "DELETE_SUBSCR"),
    (62, "BINARY_LSHIFT"),
    (63, "BINARY_RSHIFT"),
    (64, "BINARY_AND"),
    (65, "BINARY_XOR"),
    (66, "BINARY_OR"),
    (67, "INPLACE_POWER"),
    (68, "GET_ITER"),
    (70, "PRINT_EXPR"),
    (71, "PRINT_ITEM"),
    (72, "PRINT_NEWLINE"),
    (73, "PRINT_ITEM_TO"),
    (74, "PRINT_NEWLINE_TO"),
    (75, "INPLACE_LSHIFT"),
    (76, "INPLACE_RSHIFT"),
    (77, "INPLACE_AND"),
    (78, "INPLACE_XOR"),
    (79, "INPLACE_OR"),
    (80, "BREAK_LOOP"),
    (81, "WITH_CLEANUP"),
    (83, "RETURN_VALUE"),
    (84, "IMPORT_STAR"),
    (85, "EXEC_STMT"),
    (86, "YIELD_VALUE"),
    (87, "POP_BLOCK"),
    (88, "END_FINALLY"),
    (89, "BUILD_CLASS"),
    (91, "STORE_NAME"),
    (92, "DELETE_NAME"),
    (93, "UNPACK_SEQUENCE"),
    (94, "FOR_ITER"),
    (95, "LIST_APPEND_ARG"),
    (96, "STORE_ATTR"),
    (97, "DELETE_ATTR"),
    (98, "STORE_GLOBAL"),
    (99, "DELETE_GLOBAL"),
    (100, "DUP_TOPX"),
    (101, "LOAD_CONST"),
    (102, "LOAD_NAME"),
    (103, "BUILD_TUPLE"),
    (104, "BUILD_LIST"),
    (105, "BUILD_SET"),
    (106, "BUILD_MAP"),
    (107, "LOAD_ATTR"),
    (108, "COMPARE_OP"),
    (109, "IMPORT_NAME"),
    (110, "IMPORT_FROM"),
    (111, "JUMP_FORWARD"),
    (112, "JUMP_IF_FALSE_OR_POP"),
    (113, "JUMP_IF_TRUE_OR_POP"),
    (114, "JUMP_ABSOLUTE"),
    (115, "POP_JUMP_IF_FALSE"),
    (116, "POP_JUMP_IF_TRUE"),
    (117, "LOAD_GLOBAL"),
    (119, "CONTINUE_LOOP"),
    (120, "SETUP_LOOP"),
    (121, "SETUP_EXCEPT"),
    (122, "SETUP_FINALLY"),
    (124, "LOAD_FAST"),
    (125, "STORE_FAST"),
    (126, "DELETE_FAST"),
    (130, "RAISE_VARARGS"),
    (131, "CALL_FUNCTION"),
    (132, "MAKE_FUNCTION"),
    (133, "BUILD_SLICE"),
    (134, "MAKE_CLOSURE"),
    (135, "LOAD_CLOSURE"),
    (136, "LOAD_DEREF"),
    (137, "STORE_DEREF"),
    (140, "CALL_FUNCTION_VAR"),
    (141, "CALL_FUNCTION_KW"),
    (142, "CALL_FUNCTION_VAR_KW"),
    (143, "SETUP_WITH"),
    (145, "EXTENDED_ARG"),
    (146, "SET_ADD_ARG"),
    (147, "MAP_ADD_ARG"),
];

/// Python 3.2. Classic division and the `print`/`exec` statements are gone
/// (and with them `BINARY_DIVIDE`, `INPLACE_DIVIDE`, `PRINT_*`, `EXEC_STMT`),
/// the `SLICE`/`STORE_SLICE`/`DELETE_SLICE` families were replaced by
/// ordinary `BINARY_SUBSCR`/`STORE_SUBSCR` on slice objects, and code
/// objects gained `co_kwonlyargcount`.
const PY32_ENTRIES: &[(u8, &str)] = &[
    (1, "POP_TOP"),
    (2, "ROT_TWO"),
    (3, "ROT_THREE"),
    (4, "DUP_TOP"),
    (5, "DUP_TOP_TWO"),
    (9, "NOP"),
    (10, "UNARY_POSITIVE"),
    (11, "UNARY_NEGATIVE"),
    (12, "UNARY_NOT"),
    (15, "UNARY_INVERT"),
    (19, "BINARY_POWER"),
    (20, "BINARY_MULTIPLY"),
    (22, "BINARY_MODULO"),
    (23, "BINARY_ADD"),
    (24, "BINARY_SUBTRACT"),
    (25, "BINARY_SUBSCR"),
    (26, "BINARY_FLOOR_DIVIDE"),
    (27, "BINARY_TRUE_DIVIDE"),
    (28, "INPLACE_FLOOR_DIVIDE"),
    (29, "INPLACE_TRUE_DIVIDE"),
    (55, "INPLACE_ADD"),
    (56, "INPLACE_SUBTRACT"),
    (57, "INPLACE_MULTIPLY"),
    (59, "INPLACE_MODULO"),
    (60, "STORE_SUBSCR"),
    (61, "DELETE_SUBSCR"),
    (62, "BINARY_LSHIFT"),
    (63, "BINARY_RSHIFT"),
    (64, "BINARY_AND"),
    (65, "BINARY_XOR"),
    (66, "BINARY_OR"),
    (67, "INPLACE_POWER"),
    (68, "GET_ITER"),
    (70, "PRINT_EXPR"),
    (75, "INPLACE_LSHIFT"),
    (76, "INPLACE_RSHIFT"),
    (77, "INPLACE_AND"),
    (78, "INPLACE_XOR"),
    (79, "INPLACE_OR"),
    (80, "BREAK_LOOP"),
    (81, "WITH_CLEANUP"),
    (83, "RETURN_VALUE"),
    (84, "IMPORT_STAR"),
    (86, "YIELD_VALUE"),
    (87, "POP_BLOCK"),
    (88, "END_FINALLY"),
    (89, "BUILD_CLASS"),
    (90, "SETUP_WITH"),
    (91, "STORE_NAME"),
    (92, "DELETE_NAME"),
    (93, "UNPACK_SEQUENCE"),
    (94, "FOR_ITER"),
    (95, "LIST_APPEND_ARG"),
    (96, "STORE_ATTR"),
    (97, "DELETE_ATTR"),
    (98, "STORE_GLOBAL"),
    (99, "DELETE_GLOBAL"),
    (101, "LOAD_CONST"),
    (102, "LOAD_NAME"),
    (103, "BUILD_TUPLE"),
    (104, "BUILD_LIST"),
    (105, "BUILD_SET"),
    (106, "BUILD_MAP"),
    (107, "LOAD_ATTR"),
    (108, "COMPARE_OP"),
    (109, "IMPORT_NAME"),
    (110, "IMPORT_FROM"),
    (111, "JUMP_FORWARD"),
    (112, "JUMP_IF_FALSE_OR_POP"),
    (113, "JUMP_IF_TRUE_OR_POP"),
    (114, "JUMP_ABSOLUTE"),
    (115, "POP_JUMP_IF_FALSE"),
    (116, "POP_JUMP_IF_TRUE"),
    (117, "LOAD_GLOBAL"),
    (119, "CONTINUE_LOOP"),
    (120, "SETUP_LOOP"),
    (121, "SETUP_EXCEPT"),
    (122, "SETUP_FINALLY"),
    (124, "LOAD_FAST"),
    (125, "STORE_FAST"),
    (126, "DELETE_FAST"),
    (130, "RAISE_VARARGS"),
    (131, "CALL_FUNCTION"),
    (132, "MAKE_FUNCTION"),
    (133, "BUILD_SLICE"),
    (134, "MAKE_CLOSURE"),
    (135, "LOAD_CLOSURE"),
    (136, "LOAD_DEREF"),
    (137, "STORE_DEREF"),
    (140, "CALL_FUNCTION_VAR"),
    (141, "CALL_FUNCTION_KW"),
    (142, "CALL_FUNCTION_VAR_KW"),
    (145, "EXTENDED_ARG"),
    (146, "SET_ADD_ARG"),
    (147, "MAP_ADD_ARG"),
];

/// Revisions sorted ascending by magic number, as required by [`revision_for_magic`].
static REVISIONS: &[Revision] = &[
    Revision {
        magic: 62_161,
        version: "2.6",
        has_kwonlyargcount: false,
        has_timestamp_padding: false,
        entries: PY26_ENTRIES,
    },
    Revision {
        magic: 62_211,
        version: "2.7",
        has_kwonlyargcount: false,
        has_timestamp_padding: false,
        entries: PY27_ENTRIES,
    },
    Revision {
        magic: 3_180,
        version: "3.2",
        has_kwonlyargcount: true,
        has_timestamp_padding: false,
        entries: PY32_ENTRIES,
    },
];

/// Names that carry a 2-byte little-endian argument, unioned across every
/// revision above. A name appears here only if *every* revision in which it
/// is renamed to this exact spelling carries an argument; the `_ARG` suffix
/// on `LIST_APPEND_ARG`/`SET_ADD_ARG`/`MAP_ADD_ARG` exists precisely so this
/// set doesn't have to vary by revision.
const HAS_ARGUMENT: &[&str] = &[
    "STORE_NAME",
    "DELETE_NAME",
    "UNPACK_SEQUENCE",
    "FOR_ITER",
    "LIST_APPEND_ARG",
    "STORE_ATTR",
    "DELETE_ATTR",
    "STORE_GLOBAL",
    "DELETE_GLOBAL",
    "DUP_TOPX",
    "LOAD_CONST",
    "LOAD_NAME",
    "BUILD_TUPLE",
    "BUILD_LIST",
    "BUILD_SET",
    "BUILD_MAP",
    "LOAD_ATTR",
    "COMPARE_OP",
    "IMPORT_NAME",
    "IMPORT_FROM",
    "JUMP_FORWARD",
    "JUMP_IF_FALSE_OR_POP",
    "JUMP_IF_TRUE_OR_POP",
    "JUMP_ABSOLUTE",
    "POP_JUMP_IF_FALSE",
    "POP_JUMP_IF_TRUE",
    "JUMP_IF_FALSE",
    "JUMP_IF_TRUE",
    "LOAD_GLOBAL",
    "CONTINUE_LOOP",
    "SETUP_LOOP",
    "SETUP_EXCEPT",
    "SETUP_FINALLY",
    "LOAD_FAST",
    "STORE_FAST",
    "DELETE_FAST",
    "RAISE_VARARGS",
    "CALL_FUNCTION",
    "MAKE_FUNCTION",
    "BUILD_SLICE",
    "MAKE_CLOSURE",
    "LOAD_CLOSURE",
    "LOAD_DEREF",
    "STORE_DEREF",
    "CALL_FUNCTION_VAR",
    "CALL_FUNCTION_KW",
    "CALL_FUNCTION_VAR_KW",
    "EXTENDED_ARG",
    "SET_ADD_ARG",
    "MAP_ADD_ARG",
];

/// Returns the revision whose opcode table applies to `magic`: an exact
/// match if one exists, otherwise the revision with the smallest magic
/// number that is still `>=` the requested one. Revisions are sorted
/// ascending, so the first satisfying entry is the answer.
pub fn revision_for_magic(magic: u32) -> Option<&'static Revision> {
    REVISIONS.iter().find(|rev| rev.magic >= magic)
}

/// Decodes `byte` to its normalized opcode name under the table selected by `magic`.
pub fn decode(magic: u32, byte: u8) -> Option<&'static str> {
    revision_for_magic(magic)?.name_for(byte)
}

/// Whether `name` carries a 2-byte argument, independent of revision.
pub fn has_argument(name: &str) -> bool {
    HAS_ARGUMENT.contains(&name)
}

/// Whether code objects produced under `magic` carry `co_kwonlyargcount`.
pub fn has_kwonlyargcount(magic: u32) -> Option<bool> {
    revision_for_magic(magic).map(|rev| rev.has_kwonlyargcount)
}

/// A human-readable interpreter version string for `magic` (e.g. `"2.7"`).
pub fn python_version(magic: u32) -> Option<&'static str> {
    revision_for_magic(magic).map(|rev| rev.version)
}
