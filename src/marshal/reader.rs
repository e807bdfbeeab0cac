use super::bigint::BigInt;
use super::cursor::Cursor;
use super::error::DecodeError;
use super::types::{CodeFlags, CodeObject, Module, OpArg, Opcode};
use super::value::Value;

const TYPE_NULL: u8 = b'0';
const TYPE_NONE: u8 = b'N';
const TYPE_FALSE: u8 = b'F';
const TYPE_TRUE: u8 = b'T';
const TYPE_STOP_ITER: u8 = b'S';
const TYPE_ELLIPSIS: u8 = b'.';
const TYPE_INT: u8 = b'i';
const TYPE_INT64: u8 = b'I';
const TYPE_FLOAT: u8 = b'f';
const TYPE_BINARY_FLOAT: u8 = b'g';
const TYPE_COMPLEX: u8 = b'x';
const TYPE_BINARY_COMPLEX: u8 = b'y';
const TYPE_LONG: u8 = b'l';
const TYPE_STRING: u8 = b's';
const TYPE_INTERNED: u8 = b't';
const TYPE_STRING_REF: u8 = b'R';
const TYPE_TUPLE: u8 = b'(';
const TYPE_LIST: u8 = b'[';
const TYPE_DICT: u8 = b'{';
const TYPE_CODE: u8 = b'c';
const TYPE_UNICODE: u8 = b'u';
const TYPE_SET: u8 = b'<';
const TYPE_FROZEN_SET: u8 = b'>';

/// Limits applied while decoding a single module, separate from the
/// higher-level [`crate::pipeline::Options`] so the marshal layer doesn't
/// depend on the pipeline layer.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_recursion_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_recursion_depth: 64,
        }
    }
}

/// Decodes a full module with default [`Limits`].
pub fn read_module(data: &[u8]) -> Result<Module, DecodeError> {
    read_module_with_limits(data, Limits::default())
}

/// Decodes a full module: an 8-byte header followed by one marshalled value,
/// which must be a code object.
pub fn read_module_with_limits(data: &[u8], limits: Limits) -> Result<Module, DecodeError> {
    let mut cursor = Cursor::new(data);
    let magic = cursor.read_u32_le()?;
    let timestamp = cursor.read_u32_le()?;
    let revision = crate::opcode::revision_for_magic(magic)
        .ok_or(DecodeError::UnknownMagic { magic, offset: 0 })?;

    tracing::debug!(magic, version = revision.version, "decoding module header");

    if revision.has_timestamp_padding {
        cursor.read_u16_le()?;
    }

    let mut decoder = Decoder {
        cursor,
        magic,
        string_table: Vec::new(),
        limits,
        depth: 0,
    };
    let value = decoder.unmarshal_value()?;
    let body = match value {
        Value::Code(code) => *code,
        _ => {
            return Err(DecodeError::UnexpectedTag {
                tag: 0,
                offset: decoder.cursor.position(),
            })
        }
    };

    Ok(Module {
        magic,
        timestamp,
        interpreter_version: revision.version.to_string(),
        body,
    })
}

struct Decoder<'input> {
    cursor: Cursor<'input>,
    magic: u32,
    string_table: Vec<String>,
    limits: Limits,
    depth: usize,
}

impl<'input> Decoder<'input> {
    fn unmarshal_value(&mut self) -> Result<Value, DecodeError> {
        let tag = self.cursor.read_u8()?;
        match tag {
            TYPE_NULL => Ok(Value::Null),
            TYPE_NONE => Ok(Value::None),
            TYPE_FALSE => Ok(Value::False),
            TYPE_TRUE => Ok(Value::True),
            TYPE_STOP_ITER => Ok(Value::StopIteration),
            TYPE_ELLIPSIS => Ok(Value::Ellipsis),
            TYPE_INT => Ok(Value::Int(self.cursor.read_i32_le()? as i64)),
            TYPE_INT64 => Ok(Value::Int(self.cursor.read_i64_le()?)),
            TYPE_FLOAT => {
                let text = self.read_pascal_string_ascii()?;
                let parsed: f64 = text
                    .parse()
                    .map_err(|_| DecodeError::UnexpectedTag {
                        tag,
                        offset: self.cursor.position(),
                    })?;
                Ok(Value::Float(parsed))
            }
            TYPE_BINARY_FLOAT => Ok(Value::Float(self.cursor.read_f64_le()?)),
            TYPE_COMPLEX => {
                let real: f64 = self
                    .read_pascal_string_ascii()?
                    .parse()
                    .map_err(|_| DecodeError::UnexpectedTag {
                        tag,
                        offset: self.cursor.position(),
                    })?;
                let imag: f64 = self
                    .read_pascal_string_ascii()?
                    .parse()
                    .map_err(|_| DecodeError::UnexpectedTag {
                        tag,
                        offset: self.cursor.position(),
                    })?;
                Ok(Value::Complex(real, imag))
            }
            TYPE_BINARY_COMPLEX => {
                let real = self.cursor.read_f64_le()?;
                let imag = self.cursor.read_f64_le()?;
                Ok(Value::Complex(real, imag))
            }
            TYPE_LONG => self.unmarshal_long(),
            TYPE_STRING => Ok(Value::Bytes(self.read_byte_array()?.to_vec())),
            TYPE_INTERNED => {
                let s = self.read_string_utf8_or_ascii()?;
                self.string_table.push(s.clone());
                Ok(Value::Str(s))
            }
            TYPE_STRING_REF => {
                let index = self.cursor.read_i32_le()?;
                self.string_table
                    .get(index as usize)
                    .cloned()
                    .map(Value::Str)
                    .ok_or(DecodeError::StringRefOutOfRange {
                        index,
                        offset: self.cursor.position(),
                    })
            }
            TYPE_UNICODE => Ok(Value::Str(self.read_string_utf8_or_ascii()?)),
            TYPE_TUPLE => self.unmarshal_collection(Value::Tuple),
            TYPE_LIST => self.unmarshal_collection(Value::List),
            TYPE_SET => self.unmarshal_collection(Value::Set),
            TYPE_FROZEN_SET => self.unmarshal_collection(Value::FrozenSet),
            TYPE_DICT => self.unmarshal_dict(),
            TYPE_CODE => self.unmarshal_code(),
            other => Err(DecodeError::UnexpectedTag {
                tag: other,
                offset: self.cursor.position(),
            }),
        }
    }

    fn unmarshal_long(&mut self) -> Result<Value, DecodeError> {
        let raw_count = self.cursor.read_i32_le()?;
        let negative = raw_count < 0;
        let count = raw_count.unsigned_abs() as usize;
        let mut digits = Vec::with_capacity(count);
        for _ in 0..count {
            digits.push(self.cursor.read_u16_le()?);
        }
        let big = BigInt::from_marshal_digits(&digits, negative);
        Ok(Value::BigInt(big))
    }

    fn unmarshal_collection(
        &mut self,
        wrap: fn(Vec<Value>) -> Value,
    ) -> Result<Value, DecodeError> {
        let count = self.cursor.read_i32_le()?.max(0) as usize;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.unmarshal_value()?);
        }
        Ok(wrap(items))
    }

    fn unmarshal_dict(&mut self) -> Result<Value, DecodeError> {
        let mut items = Vec::new();
        loop {
            if self.cursor.peek_u8()? == TYPE_NULL {
                self.cursor.read_u8()?;
                break;
            }
            let key = self.unmarshal_value()?;
            let value = self.unmarshal_value()?;
            items.push((key, value));
        }
        Ok(Value::Dict(items))
    }

    fn unmarshal_code(&mut self) -> Result<Value, DecodeError> {
        self.depth += 1;
        if self.depth > self.limits.max_recursion_depth {
            return Err(DecodeError::RecursionLimitExceeded {
                offset: self.cursor.position(),
            });
        }

        let argcount = self.cursor.read_i32_le()?;
        let revision = crate::opcode::revision_for_magic(self.magic)
            .ok_or(DecodeError::UnknownMagic {
                magic: self.magic,
                offset: self.cursor.position(),
            })?;
        let kwonlyargcount = if revision.has_kwonlyargcount {
            self.cursor.read_i32_le()?
        } else {
            0
        };
        let nlocals = self.cursor.read_i32_le()?;
        let stacksize = self.cursor.read_i32_le()?;
        let flags = CodeFlags::from_bits_retain(self.cursor.read_i32_le()? as u32);

        let code_tag = self.cursor.read_u8()?;
        if code_tag != TYPE_STRING {
            return Err(DecodeError::UnexpectedTag {
                tag: code_tag,
                offset: self.cursor.position(),
            });
        }
        let code = self.read_byte_array()?.to_vec();

        let consts = self.unmarshal_value_list()?;
        let names = self.unmarshal_string_list()?;
        let varnames = self.unmarshal_string_list()?;
        let freevars = self.unmarshal_string_list()?;
        let cellvars = self.unmarshal_string_list()?;
        let filename = self.unmarshal_required_string()?;
        let name = self.unmarshal_required_string()?;
        let firstlineno = self.cursor.read_i32_le()?;
        let lnotab = match self.unmarshal_value()? {
            Value::Bytes(bytes) => bytes,
            Value::Str(s) => s.into_bytes(),
            _ => {
                return Err(DecodeError::UnexpectedTag {
                    tag: 0,
                    offset: self.cursor.position(),
                })
            }
        };

        let opcodes = decode_bytecode(self.magic, &code, &consts, &names, &varnames)?;

        self.depth -= 1;

        Ok(Value::Code(Box::new(CodeObject {
            argcount,
            kwonlyargcount,
            nlocals,
            stacksize,
            flags,
            code,
            consts,
            names,
            varnames,
            freevars,
            cellvars,
            filename,
            name,
            firstlineno,
            lnotab,
            opcodes,
        })))
    }

    fn unmarshal_value_list(&mut self) -> Result<Vec<Value>, DecodeError> {
        match self.unmarshal_value()? {
            Value::Tuple(items) | Value::List(items) => Ok(items),
            _ => Err(DecodeError::UnexpectedTag {
                tag: 0,
                offset: self.cursor.position(),
            }),
        }
    }

    fn unmarshal_string_list(&mut self) -> Result<Vec<String>, DecodeError> {
        let items = self.unmarshal_value_list()?;
        items
            .into_iter()
            .map(|v| match v {
                Value::Str(s) => Ok(s),
                _ => Err(DecodeError::UnexpectedTag {
                    tag: 0,
                    offset: self.cursor.position(),
                }),
            })
            .collect()
    }

    fn unmarshal_required_string(&mut self) -> Result<String, DecodeError> {
        match self.unmarshal_value()? {
            Value::Str(s) => Ok(s),
            _ => Err(DecodeError::UnexpectedTag {
                tag: 0,
                offset: self.cursor.position(),
            }),
        }
    }

    fn read_byte_array(&mut self) -> Result<&'input [u8], DecodeError> {
        let len = self.cursor.read_i32_le()?.max(0) as usize;
        self.cursor.read_bytes(len)
    }

    fn read_pascal_string_ascii(&mut self) -> Result<String, DecodeError> {
        let len = self.cursor.read_u8()? as usize;
        let bytes = self.cursor.read_bytes(len)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    fn read_string_utf8_or_ascii(&mut self) -> Result<String, DecodeError> {
        let bytes = self.read_byte_array()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 {
            offset: self.cursor.position(),
        })
    }
}

/// Decodes a code object's raw bytes into normalized [`Opcode`]s, resolving
/// each argument against the tables the surrounding code object already
/// carries. `EXTENDED_ARG` accumulates into the high bits of the next
/// instruction's argument rather than producing an instruction of its own.
fn decode_bytecode(
    magic: u32,
    code: &[u8],
    consts: &[Value],
    names: &[String],
    varnames: &[String],
) -> Result<Vec<Opcode>, DecodeError> {
    let mut opcodes = Vec::new();
    let mut argument: u32 = 0;
    let mut i = 0usize;
    while i < code.len() {
        let offset = i;
        let byte = code[i];
        let name = crate::opcode::decode(magic, byte).ok_or(DecodeError::UnknownBytecode {
            byte,
            offset,
        })?;
        i += 1;

        let carries_argument = crate::opcode::has_argument(name);
        if carries_argument {
            if i + 2 > code.len() {
                return Err(DecodeError::UnexpectedEndOfStream { offset: i });
            }
            let lo = code[i] as u32;
            let hi = code[i + 1] as u32;
            argument |= lo | (hi << 8);
            i += 2;
        }

        if name == "EXTENDED_ARG" {
            argument <<= 16;
            continue;
        }

        let arg = if carries_argument {
            Some(resolve_argument(name, argument, consts, names, varnames, offset)?)
        } else {
            None
        };

        opcodes.push(Opcode {
            offset,
            size: i - offset,
            name,
            arg,
        });
        argument = 0;
    }
    Ok(opcodes)
}

fn resolve_argument(
    name: &'static str,
    argument: u32,
    consts: &[Value],
    names: &[String],
    varnames: &[String],
    offset: usize,
) -> Result<OpArg, DecodeError> {
    match name {
        "LOAD_CONST" => consts
            .get(argument as usize)
            .cloned()
            .map(OpArg::Const)
            .ok_or(DecodeError::InvalidArgument { argument, offset }),
        "LOAD_NAME" | "STORE_NAME" | "DELETE_NAME" | "LOAD_ATTR" | "STORE_ATTR"
        | "DELETE_ATTR" | "LOAD_GLOBAL" | "STORE_GLOBAL" | "DELETE_GLOBAL" | "IMPORT_NAME"
        | "IMPORT_FROM" => names
            .get(argument as usize)
            .cloned()
            .map(OpArg::Name)
            .ok_or(DecodeError::InvalidArgument { argument, offset }),
        "LOAD_FAST" | "STORE_FAST" | "DELETE_FAST" => varnames
            .get(argument as usize)
            .cloned()
            .map(OpArg::Name)
            .ok_or(DecodeError::InvalidArgument { argument, offset }),
        _ => Ok(OpArg::Raw(argument)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn py27_header() -> Vec<u8> {
        let mut bytes = 62_211u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes
    }

    #[test]
    fn unmarshal_none_and_singletons() {
        let mut decoder = Decoder {
            cursor: Cursor::new(&[TYPE_NONE]),
            magic: 62_211,
            string_table: Vec::new(),
            limits: Limits::default(),
            depth: 0,
        };
        assert_eq!(decoder.unmarshal_value().unwrap(), Value::None);
    }

    #[test]
    fn unmarshal_small_int() {
        let data = [TYPE_INT, 0x2A, 0x00, 0x00, 0x00];
        let mut decoder = Decoder {
            cursor: Cursor::new(&data),
            magic: 62_211,
            string_table: Vec::new(),
            limits: Limits::default(),
            depth: 0,
        };
        assert_eq!(decoder.unmarshal_value().unwrap(), Value::Int(42));
    }

    #[test]
    fn unmarshal_interned_string_then_ref() {
        let mut data = vec![TYPE_INTERNED];
        data.extend_from_slice(&3i32.to_le_bytes());
        data.extend_from_slice(b"abc");
        data.push(TYPE_STRING_REF);
        data.extend_from_slice(&0i32.to_le_bytes());

        let mut decoder = Decoder {
            cursor: Cursor::new(&data),
            magic: 62_211,
            string_table: Vec::new(),
            limits: Limits::default(),
            depth: 0,
        };
        assert_eq!(
            decoder.unmarshal_value().unwrap(),
            Value::Str("abc".to_string())
        );
        assert_eq!(
            decoder.unmarshal_value().unwrap(),
            Value::Str("abc".to_string())
        );
    }

    #[test]
    fn dict_terminates_on_null_tag() {
        let mut data = vec![TYPE_DICT];
        data.push(TYPE_INT);
        data.extend_from_slice(&1i32.to_le_bytes());
        data.push(TYPE_INT);
        data.extend_from_slice(&2i32.to_le_bytes());
        data.push(TYPE_NULL);

        let mut decoder = Decoder {
            cursor: Cursor::new(&data),
            magic: 62_211,
            string_table: Vec::new(),
            limits: Limits::default(),
            depth: 0,
        };
        assert_eq!(
            decoder.unmarshal_value().unwrap(),
            Value::Dict(vec![(Value::Int(1), Value::Int(2))])
        );
    }

    #[test]
    fn decode_bytecode_resolves_load_const() {
        // LOAD_CONST 0; RETURN_VALUE
        let code = [101u8, 0, 0, 83];
        let consts = vec![Value::Int(7)];
        let opcodes = decode_bytecode(62_211, &code, &consts, &[], &[]).unwrap();
        assert_eq!(opcodes.len(), 2);
        assert_eq!(opcodes[0].name, "LOAD_CONST");
        assert_eq!(opcodes[0].arg, Some(OpArg::Const(Value::Int(7))));
        assert_eq!(opcodes[1].name, "RETURN_VALUE");
        assert_eq!(opcodes[1].arg, None);
    }

    #[test]
    fn extended_arg_accumulates_into_next_instruction() {
        // EXTENDED_ARG 1; LOAD_CONST (1<<16 | 0) -- out of range on purpose to hit InvalidArgument cleanly
        let code = [145u8, 1, 0, 101, 0, 0];
        let err = decode_bytecode(62_211, &code, &[], &[], &[]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidArgument { argument: 65536, .. }));
    }

    #[test]
    fn unknown_magic_header_is_rejected() {
        let err = read_module(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownMagic { .. }));
    }

    #[test]
    fn header_alone_is_not_enough_data() {
        let header = py27_header();
        let err = read_module(&header).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEndOfStream { .. }));
    }
}
