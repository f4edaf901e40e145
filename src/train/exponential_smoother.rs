use num::Float;

/// 指数平滑. 最初の `run_up_period` 回は単純平均として振る舞う
pub struct ExponentialSmootherWithRunUpPeriod<T: Float> {
    time_constant: T,
    run_up_period: T,
    time: T,
    value: T,
}

impl<T: Float> ExponentialSmootherWithRunUpPeriod<T> {
    pub fn new(time_constant: T, run_up_period: T) -> Self {
        assert!(time_constant.is_finite());
        assert!(time_constant >= T::one());
        ExponentialSmootherWithRunUpPeriod {
            time_constant,
            run_up_period,
            time: T::zero(),
            value: T::zero(),
        }
    }

    pub fn get(&self) -> T {
        self.value
    }

    pub fn add(&mut self, value: T) {
        self.time = self.time + T::one();
        let t = if self.time <= self.run_up_period { self.time } else { self.time_constant };
        self.value = ((t - T::one()) * self.value + value) / t;
    }

    pub fn reset(&mut self) {
        self.time = T::zero();
        self.value = T::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_up_is_plain_mean() {
        let mut smoother = ExponentialSmootherWithRunUpPeriod::new(10.0f64, 10.0);
        smoother.add(1.0);
        assert_eq!(smoother.get(), 1.0);
        smoother.add(3.0);
        assert_eq!(smoother.get(), 2.0);
        smoother.add(5.0);
        assert_eq!(smoother.get(), 3.0);
    }

    #[test]
    fn after_run_up_decays_with_time_constant() {
        let mut smoother = ExponentialSmootherWithRunUpPeriod::new(4.0f32, 1.0);
        smoother.add(8.0);
        smoother.add(0.0);
        assert_eq!(smoother.get(), 6.0);
        smoother.reset();
        assert_eq!(smoother.get(), 0.0);
        smoother.add(2.0);
        assert_eq!(smoother.get(), 2.0);
    }
}
