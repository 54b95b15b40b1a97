use super::{Array, Function, Value};
use crate::error::Error;

/// Member name under which an object exposes its iteration capability.
///
/// The member must be callable. Invoking it returns either an array or an
/// iterator object whose `next()` yields `{ value, done }` records.
pub const ITERATOR_KEY: &str = "@@iterator";

/// Native method `name` of the array `this`, bound to it.
pub(super) fn method(this: &Value, name: &str) -> Option<Function> {
    let function = match name {
        "map" => Function::new("map", |this, args| {
            let (items, callback) = receiver_and_callback(this, args)?;
            let mapped = items
                .iter()
                .enumerate()
                .map(|(index, item)| visit(&callback, this, index, item))
                .collect::<Result<Array, Error>>()?;
            Ok(Value::Array(mapped))
        }),
        "filter" => Function::new("filter", |this, args| {
            let (items, callback) = receiver_and_callback(this, args)?;
            let mut kept = Vec::new();
            for (index, item) in items.iter().enumerate() {
                if visit(&callback, this, index, item)?.is_truthy() {
                    kept.push(item.clone());
                }
            }
            Ok(Value::from(kept))
        }),
        "find" => Function::new("find", |this, args| {
            let (items, callback) = receiver_and_callback(this, args)?;
            for (index, item) in items.iter().enumerate() {
                if visit(&callback, this, index, item)?.is_truthy() {
                    return Ok(item.clone());
                }
            }
            Ok(Value::Undefined)
        }),
        "some" => Function::new("some", |this, args| {
            let (items, callback) = receiver_and_callback(this, args)?;
            for (index, item) in items.iter().enumerate() {
                if visit(&callback, this, index, item)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }),
        "every" => Function::new("every", |this, args| {
            let (items, callback) = receiver_and_callback(this, args)?;
            for (index, item) in items.iter().enumerate() {
                if !visit(&callback, this, index, item)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }),
        "forEach" => Function::new("forEach", |this, args| {
            let (items, callback) = receiver_and_callback(this, args)?;
            for (index, item) in items.iter().enumerate() {
                visit(&callback, this, index, item)?;
            }
            Ok(Value::Undefined)
        }),
        "reduce" => Function::new("reduce", |this, args| {
            let (items, callback) = receiver_and_callback(this, args)?;
            let mut rest = items.iter().enumerate();
            let mut accumulator = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match rest.next() {
                    Some((_, first)) => first.clone(),
                    None => {
                        return Err(Error::type_error(
                            "Reduce of empty array with no initial value",
                        ));
                    }
                },
            };
            for (index, item) in rest {
                accumulator = callback.invoke(vec![
                    accumulator,
                    item.clone(),
                    Value::Number(index as f64),
                    this.clone(),
                ])?;
            }
            Ok(accumulator)
        }),
        "includes" => Function::new("includes", |this, args| {
            let needle = args.first().cloned().unwrap_or_default();
            Ok(Value::Bool(receiver(this)?.contains(&needle)))
        }),
        "indexOf" => Function::new("indexOf", |this, args| {
            let needle = args.first().cloned().unwrap_or_default();
            let position = receiver(this)?.iter().position(|item| *item == needle);
            Ok(Value::Number(position.map_or(-1.0, |index| index as f64)))
        }),
        "join" => Function::new("join", |this, args| {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(separator) => separator.to_string(),
            };
            Ok(Value::from(receiver(this)?.join(&separator)))
        }),
        _ => return None,
    };
    Some(function.bind(this.clone()))
}

fn receiver(this: &Value) -> Result<&Array, Error> {
    this.as_array()
        .ok_or_else(|| Error::type_error(format!("array method called on {}", this.describe())))
}

fn receiver_and_callback<'a>(
    this: &'a Value,
    args: &[Value],
) -> Result<(&'a Array, Function), Error> {
    let items = receiver(this)?;
    match args.first() {
        Some(Value::Function(callback)) => Ok((items, callback.clone())),
        Some(other) => Err(Error::NotCallable(other.describe())),
        None => Err(Error::NotCallable(Value::Undefined.describe())),
    }
}

fn visit(callback: &Function, this: &Value, index: usize, item: &Value) -> Result<Value, Error> {
    callback.invoke(vec![item.clone(), Value::Number(index as f64), this.clone()])
}

/// Materializes an iterable value into a multi-pass buffer.
///
/// Arrays are returned as they are. Objects exposing [`ITERATOR_KEY`] are iterated
/// once, so single-pass iterators are fully drained here. Returns `Ok(None)` for
/// values that are not iterable.
pub(crate) fn realize(value: &Value) -> Result<Option<Array>, Error> {
    let iterate = match value {
        Value::Array(items) => return Ok(Some(items.clone())),
        Value::Object(members) => match members.get(ITERATOR_KEY) {
            Some(Value::Function(iterate)) => iterate.clone(),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };

    let iterator = iterate.call(value.clone(), vec![])?;
    if let Value::Array(items) = iterator {
        return Ok(Some(items));
    }

    let next = match iterator.get("next")? {
        Value::Function(next) => next,
        other => return Err(Error::NotCallable(other.describe())),
    };
    let mut items = Vec::new();
    loop {
        let step = next.call(iterator.clone(), vec![])?;
        if step.get("done")?.is_truthy() {
            break;
        }
        items.push(step.get("value")?);
    }
    Ok(Some(items.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    fn numbers(values: &[i32]) -> Value {
        Value::array(values.iter().map(|n| Value::from(*n)))
    }

    fn number(value: &Value) -> f64 {
        match value {
            Value::Number(n) => *n,
            _ => f64::NAN,
        }
    }

    fn double() -> Value {
        Value::function("double", |_, args| Ok(Value::from(2.0 * number(&args[0]))))
    }

    fn odd() -> Value {
        Value::function("odd", |_, args| Ok(Value::from(number(&args[0]) % 2.0 != 0.0)))
    }

    fn call(array: &Value, method: &str, args: Vec<Value>) -> Result<Value, Error> {
        array.get(method)?.call(args)
    }

    #[test]
    fn test_map_and_filter() {
        let xs = numbers(&[1, 2, 3]);
        assert_eq!(call(&xs, "map", vec![double()]).unwrap(), numbers(&[2, 4, 6]));
        assert_eq!(call(&xs, "filter", vec![odd()]).unwrap(), numbers(&[1, 3]));
    }

    #[test]
    fn test_find_some_every() {
        let xs = numbers(&[2, 3, 4]);
        assert_eq!(call(&xs, "find", vec![odd()]).unwrap(), Value::from(3));
        assert_eq!(call(&xs, "some", vec![odd()]).unwrap(), Value::Bool(true));
        assert_eq!(call(&xs, "every", vec![odd()]).unwrap(), Value::Bool(false));
        assert_eq!(call(&numbers(&[]), "find", vec![odd()]).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_reduce() {
        let sum = Value::function("sum", |_, args| {
            Ok(Value::from(number(&args[0]) + number(&args[1])))
        });
        let xs = numbers(&[1, 2, 3]);
        assert_eq!(call(&xs, "reduce", vec![sum.clone()]).unwrap(), Value::from(6));
        assert_eq!(
            call(&xs, "reduce", vec![sum.clone(), Value::from(10)]).unwrap(),
            Value::from(16)
        );
        assert!(call(&numbers(&[]), "reduce", vec![sum]).is_err());
    }

    #[test]
    fn test_search_and_join() {
        let xs = numbers(&[1, 2, 3]);
        assert_eq!(call(&xs, "includes", vec![Value::from(2)]).unwrap(), Value::Bool(true));
        assert_eq!(call(&xs, "indexOf", vec![Value::from(3)]).unwrap(), Value::from(2));
        assert_eq!(call(&xs, "indexOf", vec![Value::from(9)]).unwrap(), Value::from(-1));
        assert_eq!(call(&xs, "join", vec![]).unwrap(), Value::from("1,2,3"));
        assert_eq!(call(&xs, "join", vec![Value::from("-")]).unwrap(), Value::from("1-2-3"));
    }

    #[test]
    fn test_callback_must_be_callable() {
        let error = call(&numbers(&[1]), "map", vec![Value::from(3)]).unwrap_err();
        assert!(matches!(error, Error::NotCallable(_)));
    }

    #[test]
    fn test_unknown_method_is_absent() {
        assert_eq!(numbers(&[1]).get("push").unwrap(), Value::Undefined);
    }

    #[test]
    fn test_realize_drains_iterator_protocol() {
        let produced = Rc::new(Cell::new(0));
        let iterable = Value::object([(
            ITERATOR_KEY,
            Value::function("iterate", {
                let produced = produced.clone();
                move |_, _| {
                    let produced = produced.clone();
                    Ok(Value::object([(
                        "next",
                        Value::function("next", move |_, _| {
                            let n = produced.get();
                            produced.set(n + 1);
                            Ok(Value::object([
                                ("value", Value::from(n)),
                                ("done", Value::Bool(n >= 3)),
                            ]))
                        }),
                    )]))
                }
            }),
        )]);

        let items = realize(&iterable).unwrap().unwrap();
        assert_eq!(Value::Array(items), numbers(&[0, 1, 2]));
        assert_eq!(produced.get(), 4);
    }

    #[test]
    fn test_realize_non_iterable() {
        assert!(realize(&Value::object([("a", Value::Null)])).unwrap().is_none());
        assert!(realize(&Value::from("abc")).unwrap().is_none());
    }
}
