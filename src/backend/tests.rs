#[cfg(test)]
mod tests {
    use crate::backend::{Accumulate, LossFloat, Promote};
    use std::any::TypeId;

    fn promoted_type<Y, O>(target: Y, output: O) -> TypeId
    where
        Y: Promote<O>,
    {
        let (_, _) = target.promote(output);
        TypeId::of::<Y::Output>()
    }

    #[test]
    fn test_promotion_follows_arithmetic_precision() {
        assert_eq!(promoted_type(1.0f32, 2.0f32), TypeId::of::<f32>());
        assert_eq!(promoted_type(1.0f32, 2.0f64), TypeId::of::<f64>());
        assert_eq!(promoted_type(1.0f64, 2.0f32), TypeId::of::<f64>());
        assert_eq!(promoted_type(1i32, 2.0f32), TypeId::of::<f32>());
        assert_eq!(promoted_type(2.0f32, -1i64), TypeId::of::<f32>());
        assert_eq!(promoted_type(1i32, 2i32), TypeId::of::<f64>());
    }

    #[test]
    fn test_promote_converts_both_operands() {
        let (y, o) = (-1i32).promote(2.5f32);
        assert_eq!(y, -1.0f32);
        assert_eq!(o, 2.5f32);

        let (y, o) = 0.5f32.promote(4i64);
        assert_eq!((y, o), (0.5f32, 4.0f32));
    }

    #[test]
    fn test_params_narrow_to_evaluation_precision() {
        let p: f32 = LossFloat::from_param(2.0);
        assert_eq!(p, 2.0f32);
        assert_eq!(<f64 as LossFloat>::from_param(0.1), 0.1);
        assert_eq!(LossFloat::to_param(0.25f32), 0.25f64);
    }

    #[test]
    fn test_pair_accumulation() {
        let acc = <(f64, f64)>::identity()
            .combine((1.0, 2.0))
            .combine((0.5, -1.0))
            .scale(2.0);
        assert_eq!(acc, (3.0, 2.0));

        let scalar = <f32 as Accumulate>::identity().combine(1.5).scale(2.0);
        assert_eq!(scalar, 3.0);
    }
}
