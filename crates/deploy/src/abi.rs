//! Raw call encoding for proxy introspection and administration, and
//! coercion of JSON constructor arguments against an artifact ABI.

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::{Function, JsonAbi, Param, StateMutability},
    primitives::{Address, B256, Bytes, Selector},
};
use serde_json::Value;

/// Fixed selectors and response rules of the supported proxy convention.
///
/// These must match the deployed proxy bytecode exactly. A mismatch does not
/// fail loudly: probes simply stop answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternDescriptor {
    /// `implementation()`
    pub implementation: Selector,
    /// `getBeacon()`
    pub beacon: Selector,
    /// `upgradeTo(address)`
    pub upgrade_to: Selector,
}

/// The descriptor used by the detector and the upgrade executor.
pub const PROXY_DESCRIPTOR: PatternDescriptor = PatternDescriptor {
    implementation: Selector::new([0x5c, 0x60, 0xda, 0x1b]),
    beacon: Selector::new([0x2d, 0x6b, 0x3a, 0x6b]),
    upgrade_to: Selector::new([0x36, 0x59, 0xcf, 0xe6]),
};

/// Size of an ABI word.
const WORD: usize = 32;

/// Bytes of padding above a 20-byte address in an ABI word.
const ADDRESS_PADDING: usize = WORD - 20;

/// Name of the initializer function looked up in implementation ABIs.
pub const INITIALIZER: &str = "initialize";

impl PatternDescriptor {
    /// Call data for a zero-argument probe.
    pub fn probe(selector: Selector) -> Bytes {
        Bytes::copy_from_slice(selector.as_slice())
    }

    /// Call data for `upgradeTo(new_implementation)`: the selector followed by
    /// one left-padded address word.
    pub fn upgrade_call(&self, new_implementation: Address) -> Bytes {
        let mut data = Vec::with_capacity(4 + WORD);
        data.extend_from_slice(self.upgrade_to.as_slice());
        data.extend_from_slice(new_implementation.into_word().as_slice());
        data.into()
    }
}

/// Extract an address from a raw probe response.
///
/// The response must hold at least one word whose 12 high bytes are zero, and
/// the address must be non-zero. Anything else is not a usable answer.
pub fn address_from_response(response: &[u8]) -> Option<Address> {
    if response.len() < WORD {
        return None;
    }
    if response[..ADDRESS_PADDING].iter().any(|b| *b != 0) {
        return None;
    }

    let address = Address::from_word(B256::from_slice(&response[..WORD]));
    (!address.is_zero()).then_some(address)
}

/// Coerce one JSON argument to `ty`, walking arrays and tuples structurally.
fn coerce_value(ty: &DynSolType, arg: &Value) -> Result<DynSolValue, String> {
    match (ty, arg) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<Result<_, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) if items.len() == *len => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<Result<_, _>>()
            .map(DynSolValue::FixedArray),
        (DynSolType::Tuple(types), Value::Array(items)) if items.len() == types.len() => types
            .iter()
            .zip(items)
            .map(|(ty, item)| coerce_value(ty, item))
            .collect::<Result<_, _>>()
            .map(DynSolValue::Tuple),
        (_, Value::String(s)) => ty.coerce_str(s).map_err(|e| e.to_string()),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        (_, Value::Bool(b)) => ty.coerce_str(&b.to_string()).map_err(|e| e.to_string()),
        _ => Err(format!("unsupported argument value {arg} for {ty}")),
    }
}

/// Coerce JSON arguments to the Solidity types of `inputs`.
pub fn coerce_args(inputs: &[Param], args: &[Value]) -> Result<Vec<DynSolValue>, String> {
    if inputs.len() != args.len() {
        return Err(format!(
            "expected {} arguments, got {}",
            inputs.len(),
            args.len()
        ));
    }

    inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| format!("unresolvable type {}: {e}", param.ty))?;
            coerce_value(&ty, arg).map_err(|e| format!("cannot coerce {arg} to {}: {e}", param.ty))
        })
        .collect()
}

/// Constructor values for deploying an implementation.
///
/// A contract whose constructor takes no inputs is deployed bare and the
/// arguments are left for its initializer.
pub fn constructor_values(abi: &JsonAbi, args: &[Value]) -> Result<Vec<DynSolValue>, String> {
    match &abi.constructor {
        Some(ctor) if !ctor.inputs.is_empty() => coerce_args(&ctor.inputs, args),
        _ => Ok(Vec::new()),
    }
}

/// Constructor values that must match the constructor exactly.
///
/// Used where no initializer can consume the arguments, so arguments for an
/// inputless (or absent) constructor are an error.
pub fn exact_constructor_values(abi: &JsonAbi, args: &[Value]) -> Result<Vec<DynSolValue>, String> {
    let inputs = abi.constructor.as_ref().map_or(&[][..], |ctor| &ctor.inputs[..]);
    coerce_args(inputs, args)
}

/// ABI-encode constructor values, producing the bytes appended to creation code.
pub fn encode_constructor(abi: &JsonAbi, values: &[DynSolValue]) -> Result<Vec<u8>, String> {
    match &abi.constructor {
        Some(ctor) => ctor.abi_encode_input(values).map_err(|e| e.to_string()),
        None if values.is_empty() => Ok(Vec::new()),
        None => Err(format!(
            "contract has no constructor but {} arguments were given",
            values.len()
        )),
    }
}

/// Build the initializer payload handed to a proxy constructor.
///
/// Empty arguments give an empty payload. Otherwise the `initialize` overload
/// with matching arity is encoded; `Ok(None)` means the ABI has none and the
/// implementation is expected to initialize itself.
pub fn initializer_payload(abi: &JsonAbi, args: &[Value]) -> Result<Option<Bytes>, String> {
    if args.is_empty() {
        return Ok(Some(Bytes::new()));
    }

    let Some(initializer) = abi
        .function(INITIALIZER)
        .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
    else {
        return Ok(None);
    };

    let values = coerce_args(&initializer.inputs, args)?;
    initializer
        .abi_encode_input(&values)
        .map(|data| Some(data.into()))
        .map_err(|e| e.to_string())
}

/// Constructor values of a proxy: `(implementation or beacon, init payload)`.
pub fn proxy_constructor_args(target: Address, init_payload: &Bytes) -> Vec<DynSolValue> {
    vec![
        DynSolValue::Address(target),
        DynSolValue::Bytes(init_payload.to_vec()),
    ]
}

/// A read-only, zero-argument function of `abi` usable as a smoke test.
///
/// Chosen by name so repeated runs probe the same function.
pub fn trivial_read(abi: &JsonAbi) -> Option<&Function> {
    abi.functions()
        .filter(|f| {
            f.inputs.is_empty()
                && matches!(
                    f.state_mutability,
                    StateMutability::View | StateMutability::Pure
                )
        })
        .min_by(|a, b| a.name.cmp(&b.name))
}
